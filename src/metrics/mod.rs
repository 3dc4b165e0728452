use std::{borrow::Cow, fmt, hash::Hash};

use crate::ElementType;

/// The kinds of instrument a metric key can be backed by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// A monotonically increasing sum.
    Counter,
    /// A sum that can be increased and decreased.
    UpDownCounter,
    /// Records the distribution of observed values.
    Histogram,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstrumentKind::Counter => "Counter",
            InstrumentKind::UpDownCounter => "Up/Down Counter",
            InstrumentKind::Histogram => "Histogram",
        })
    }
}

/// The value half of a tag. Borrowed so static declarations and per-call tags
/// can share one representation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TagValue<'a> {
    Str(&'a str),
    Bool(bool),
    I64(i64),
    F64(f64),
}

impl<'a> From<&'a str> for TagValue<'a> {
    fn from(value: &'a str) -> Self {
        TagValue::Str(value)
    }
}

impl From<bool> for TagValue<'_> {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue<'_> {
    fn from(value: i64) -> Self {
        TagValue::I64(value)
    }
}

impl From<f64> for TagValue<'_> {
    fn from(value: f64) -> Self {
        TagValue::F64(value)
    }
}

impl fmt::Display for TagValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(v) => f.write_str(v),
            TagValue::Bool(v) => fmt::Display::fmt(v, f),
            TagValue::I64(v) => fmt::Display::fmt(v, f),
            TagValue::F64(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// An owned copy of a [`TagValue`], for backends that keep tags around.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedTagValue {
    Str(String),
    Bool(bool),
    I64(i64),
    F64(f64),
}

impl From<TagValue<'_>> for OwnedTagValue {
    fn from(value: TagValue<'_>) -> Self {
        match value {
            TagValue::Str(v) => OwnedTagValue::Str(v.to_string()),
            TagValue::Bool(v) => OwnedTagValue::Bool(v),
            TagValue::I64(v) => OwnedTagValue::I64(v),
            TagValue::F64(v) => OwnedTagValue::F64(v),
        }
    }
}

/// A `(name, value)` pair attached to a meter, an instrument, or a single
/// measurement.
pub type Tag<'a> = (&'a str, TagValue<'a>);

/// Namespace level metadata for a metric key type. All instruments created for
/// the key type belong to the meter this describes.
///
/// Built in `const` context:
/// ```
/// use metric_keys::{ElementType, MeterDef, TagValue};
///
/// const METER: MeterDef = MeterDef::new("my.service")
///     .version("1.0")
///     .element_type(ElementType::F64)
///     .required_tags(&["region"])
///     .tags(&[("team", TagValue::Str("storage"))]);
/// ```
#[derive(Debug, Copy, Clone)]
pub struct MeterDef {
    pub name: &'static str,
    pub version: Option<&'static str>,
    /// The element type registries for this key type must be built with.
    /// `None` accepts any.
    pub element_type: Option<ElementType>,
    /// Tag names every measurement on every instrument must supply.
    pub required_tags: &'static [&'static str],
    pub tags: &'static [Tag<'static>],
}

impl MeterDef {
    /// A meter declaring `i64` as its element type, with no version and no tags.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            version: None,
            element_type: Some(ElementType::I64),
            required_tags: &[],
            tags: &[],
        }
    }

    pub const fn version(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }

    pub const fn element_type(mut self, element_type: ElementType) -> Self {
        self.element_type = Some(element_type);
        self
    }

    /// Skip the element type check when building registries.
    pub const fn any_element_type(mut self) -> Self {
        self.element_type = None;
        self
    }

    pub const fn required_tags(mut self, required_tags: &'static [&'static str]) -> Self {
        self.required_tags = required_tags;
        self
    }

    pub const fn tags(mut self, tags: &'static [Tag<'static>]) -> Self {
        self.tags = tags;
        self
    }
}

/// A constant definition of a single instrument backing a metric key. A key may
/// carry one of these per instrument kind.
#[derive(Debug, Copy, Clone)]
pub struct MetricDef {
    pub kind: InstrumentKind,
    /// Appended to the meter name to build the full instrument name.
    pub name_suffix: &'static str,
    pub description: Option<&'static str>,
    pub unit: Option<&'static str>,
    /// Tag names required on top of the meter's required tags.
    pub required_tags: &'static [&'static str],
}

impl MetricDef {
    /// An instrument of `kind` with no description, unit or required tags.
    pub const fn new(kind: InstrumentKind, name_suffix: &'static str) -> Self {
        Self {
            kind,
            name_suffix,
            description: None,
            unit: None,
            required_tags: &[],
        }
    }

    pub const fn counter(name_suffix: &'static str) -> Self {
        Self::new(InstrumentKind::Counter, name_suffix)
    }

    pub const fn up_down_counter(name_suffix: &'static str) -> Self {
        Self::new(InstrumentKind::UpDownCounter, name_suffix)
    }

    pub const fn histogram(name_suffix: &'static str) -> Self {
        Self::new(InstrumentKind::Histogram, name_suffix)
    }

    pub const fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn required_tags(mut self, required_tags: &'static [&'static str]) -> Self {
        self.required_tags = required_tags;
        self
    }
}

/// A closed set of metric keys and the declarative metadata attached to them.
///
/// Usually generated with [`metric_keys!`](crate::metric_keys), but can be
/// implemented by hand for key types that carry their metadata elsewhere.
pub trait MetricKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every key, in declaration order.
    const KEYS: &'static [Self];

    /// Namespace metadata for the key type. A registry can't be built for a
    /// key type that returns `None`.
    fn meter() -> Option<MeterDef>;

    /// The instruments backing this key.
    fn metrics(self) -> &'static [MetricDef] {
        &[]
    }

    /// Static tags attached to every instrument created for this key.
    fn tags(self) -> &'static [Tag<'static>] {
        &[]
    }

    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Human readable name used in error messages.
    fn display_name(self) -> Cow<'static, str> {
        Cow::Owned(format!("{self:?}"))
    }
}

/// Declare an enum of metric keys along with its meter and per key instrument
/// metadata, and implement [`MetricKey`] for it.
///
/// ```
/// use metric_keys::{metric_keys, MeterDef, MetricDef, TagValue};
///
/// metric_keys! {
///     /// Request handling metrics.
///     pub enum Requests {
///         meter: MeterDef::new("my.service").version("1.0").required_tags(&["region"]);
///         Served => [MetricDef::counter("Served").description("Requests served").unit("{request}")],
///         InFlight => [MetricDef::up_down_counter("InFlight").description("Requests in flight")]
///             tags [("pool", TagValue::Str("main"))],
///         Latency => [
///             MetricDef::histogram("Latency").description("Request latency").unit("ms"),
///         ],
///         Unused,
///     }
/// }
/// ```
///
/// The generated enum derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq` and
/// `Hash`.
#[macro_export]
macro_rules! metric_keys {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            meter: $meter:expr;
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
                    $( => [ $($def:expr),* $(,)? ] )?
                    $( tags [ $($tag:expr),* $(,)? ] )?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $crate::MetricKey for $name {
            const KEYS: &'static [Self] = &[$(Self::$variant),*];

            fn meter() -> ::core::option::Option<$crate::MeterDef> {
                const METER: $crate::MeterDef = $meter;
                ::core::option::Option::Some(METER)
            }

            fn metrics(self) -> &'static [$crate::MetricDef] {
                match self {
                    $(
                        Self::$variant => {
                            const DEFS: &[$crate::MetricDef] = &[$($($def),*)?];
                            DEFS
                        }
                    )*
                }
            }

            fn tags(self) -> &'static [$crate::Tag<'static>] {
                match self {
                    $(
                        Self::$variant => {
                            const TAGS: &[$crate::Tag<'static>] = &[$($($tag),*)?];
                            TAGS
                        }
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Everything, Unmetered, Untyped};

    #[test]
    fn macro_keeps_declaration_order() {
        assert_eq!(
            Everything::KEYS,
            &[
                Everything::CounterMetric,
                Everything::UpDownMetric,
                Everything::HistogramMetric,
                Everything::EverythingMetric,
            ]
        );
        let kinds: Vec<_> = Everything::EverythingMetric
            .metrics()
            .iter()
            .map(|def| def.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                InstrumentKind::Counter,
                InstrumentKind::UpDownCounter,
                InstrumentKind::Histogram
            ]
        );
    }

    #[test]
    fn macro_attaches_metadata() {
        let meter = Everything::meter().unwrap();
        assert_eq!(meter.name, "My.Meter.Namespace");
        assert_eq!(meter.version, Some("beta-1.0"));
        assert_eq!(meter.element_type, Some(ElementType::I64));
        assert_eq!(meter.required_tags, &["Tag1", "Tag2"]);
        assert_eq!(
            meter.tags,
            &[("MyMetricTag", TagValue::Str("MyMetricTagValue"))]
        );

        let counter = Everything::CounterMetric.metrics()[0];
        assert_eq!(counter.unit, Some("MadeUpUnit"));
        assert_eq!(counter.description, Some("Test Counter Metric"));
        assert_eq!(counter.required_tags, &["CounterName"]);
        assert!(Everything::CounterMetric.tags().is_empty());
        assert_eq!(
            Everything::EverythingMetric.tags(),
            &[("EverythingMetric", TagValue::Bool(true))]
        );
    }

    #[test]
    fn description_is_optional() {
        const BARE: MetricDef = MetricDef::histogram("Sizes");
        assert_eq!(BARE.description, None);
        assert_eq!(BARE.description("Size distribution").description, Some("Size distribution"));
        assert_eq!(Untyped::Hits.metrics()[0].description, None);
    }

    #[test]
    fn display_names() {
        assert_eq!(InstrumentKind::UpDownCounter.to_string(), "Up/Down Counter");
        assert_eq!(Everything::CounterMetric.display_name(), "CounterMetric");
        assert!(Unmetered::meter().is_none());
        assert!(Unmetered::type_name().ends_with("Unmetered"));
    }

    #[test]
    fn owned_tag_values() {
        assert_eq!(
            OwnedTagValue::from(TagValue::from("x")),
            OwnedTagValue::Str("x".into())
        );
        assert_eq!(OwnedTagValue::from(TagValue::from(true)), OwnedTagValue::Bool(true));
        assert_eq!(TagValue::from(2.5).to_string(), "2.5");
    }
}
