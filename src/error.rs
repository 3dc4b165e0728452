use thiserror::Error;

use crate::{backend::BackendError, metrics::InstrumentKind, ElementType, Number};

/// Errors raised while building a [`Registry`](crate::Registry) or dispatching
/// a measurement through one.
#[derive(Debug, Error)]
pub enum Error {
    /// The key type returned no [`MeterDef`](crate::MeterDef).
    #[error("type '{key_type}' has no meter definition")]
    MeterMetadataMissing { key_type: &'static str },

    #[error("type '{key_type}' specifies an element type of '{declared}' but this registry was created with an element type of '{configured}'")]
    ElementTypeMismatch {
        key_type: &'static str,
        declared: ElementType,
        configured: ElementType,
    },

    #[error("element type '{0}' is not supported by the default amount policy")]
    UnsupportedElementType(ElementType),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// More than one instrument could serve a call that didn't name a kind.
    #[error("multiple instruments found for metric '{metric}'")]
    AmbiguousInstrument {
        metric: String,
        kinds: Vec<InstrumentKind>,
    },

    #[error("no instruments found for metric '{metric}'")]
    NoInstrument { metric: String },

    #[error("no compatible instruments found for metric '{metric}'")]
    NoCompatibleInstrument { metric: String },

    #[error("there is no metric named '{metric}' with an instrument type of '{kind:?}' defined")]
    InstrumentNotFound {
        metric: String,
        kind: InstrumentKind,
    },

    #[error("missing required tag(s): {}", .missing.join(", "))]
    MissingRequiredTags { missing: Vec<&'static str> },

    #[error("amount must be greater than zero, got {amount}")]
    InvalidAmount { amount: Number },

    #[error("element type '{element_type}' cannot hold a negative amount")]
    UnsignedNegation { element_type: ElementType },

    #[error("metric '{metric}' is not an {}", InstrumentKind::UpDownCounter)]
    InvalidOperationForKind {
        metric: String,
        kind: InstrumentKind,
    },

    #[error("metric '{metric}' does not support instrument type '{kind}'")]
    IncompatibleInstrument {
        metric: String,
        kind: InstrumentKind,
    },
}
