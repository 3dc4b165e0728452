//! Turns the declarative metadata on a [`MetricKey`] type into one
//! [`InstrumentInfo`] per declared instrument.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use smallvec::SmallVec;

use crate::{
    metrics::{InstrumentKind, MeterDef, MetricDef, MetricKey, Tag},
    utils::dot_notation,
    Error,
};

/// Everything known about one instrument backing a metric key.
///
/// Two infos are equal when they describe the same `(key, kind)` pair, the
/// rest of the fields don't take part in identity.
#[derive(Clone)]
pub struct InstrumentInfo<K> {
    key: K,
    kind: InstrumentKind,
    name_suffix: &'static str,
    name: String,
    unit: Option<&'static str>,
    description: Option<&'static str>,
    required_tags: SmallVec<[&'static str; 8]>,
    tags: &'static [Tag<'static>],
}

impl<K: MetricKey> InstrumentInfo<K> {
    fn new(meter: &MeterDef, key: K, def: &MetricDef) -> Self {
        // NOTE: required tags are concatenated as declared. A tag named on both
        // the meter and the metric shows up twice, and so will its absence.
        let required_tags = meter
            .required_tags
            .iter()
            .chain(def.required_tags)
            .copied()
            .collect();
        Self {
            key,
            kind: def.kind,
            name_suffix: def.name_suffix,
            name: dot_notation(&format!("{} {}", meter.name, def.name_suffix), true),
            unit: def.unit,
            description: def.description,
            required_tags,
            tags: key.tags(),
        }
    }

    pub fn key(&self) -> K {
        self.key
    }

    pub fn kind(&self) -> InstrumentKind {
        self.kind
    }

    pub fn name_suffix(&self) -> &'static str {
        self.name_suffix
    }

    /// The full instrument name, the meter name and suffix in dot notation.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.unit
    }

    pub fn description(&self) -> Option<&'static str> {
        self.description
    }

    /// Tag names every measurement must supply, meter level names first.
    pub fn required_tags(&self) -> &[&'static str] {
        &self.required_tags
    }

    /// Static tags passed to the backend when the instrument is created.
    pub fn tags(&self) -> &'static [Tag<'static>] {
        self.tags
    }
}

impl<K: MetricKey> PartialEq for InstrumentInfo<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.kind == other.kind
    }
}

impl<K: MetricKey> Eq for InstrumentInfo<K> {}

impl<K: MetricKey> Hash for InstrumentInfo<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.kind.hash(state);
    }
}

impl<K: MetricKey> fmt::Debug for InstrumentInfo<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentInfo")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("description", &self.description)
            .field("required_tags", &self.required_tags)
            .field("tags", &self.tags)
            .finish()
    }
}

impl<K: MetricKey> fmt::Display for InstrumentInfo<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "metric {} instrument info for '{}'",
            self.kind,
            self.key.display_name()
        )
    }
}

/// Read the meter and instrument metadata declared on `K`.
///
/// Keys are visited in declaration order, and each key's instruments in the
/// order they were declared on it. Duplicate `(key, kind)` pairs are returned
/// as is; the registry decides what to do with them.
pub fn extract<K: MetricKey>() -> Result<(MeterDef, Vec<InstrumentInfo<K>>), Error> {
    let meter = K::meter().ok_or(Error::MeterMetadataMissing {
        key_type: K::type_name(),
    })?;
    let infos = K::KEYS
        .iter()
        .flat_map(|&key| {
            key.metrics()
                .iter()
                .map(move |def| InstrumentInfo::new(&meter, key, def))
        })
        .collect();
    Ok((meter, infos))
}

/// The meter name declared on `K`. Hosts use this to enable the meter on
/// whatever exports measurements.
pub fn meter_name<K: MetricKey>() -> Result<&'static str, Error> {
    K::meter()
        .map(|meter| meter.name)
        .ok_or(Error::MeterMetadataMissing {
            key_type: K::type_name(),
        })
}
