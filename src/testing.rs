//! Metric key fixtures shared by the unit tests.

use std::{io, sync::Arc};

use parking_lot::Mutex;

use crate::{metric_keys, ElementType, MeterDef, MetricDef, MetricKey, TagValue};

metric_keys! {
    pub enum Everything {
        meter: MeterDef::new("My.Meter.Namespace")
            .version("beta-1.0")
            .required_tags(&["Tag1", "Tag2"])
            .tags(&[("MyMetricTag", TagValue::Str("MyMetricTagValue"))]);
        CounterMetric => [
            MetricDef::counter("CounterMetric")
                .description("Test Counter Metric")
                .unit("MadeUpUnit")
                .required_tags(&["CounterName"]),
        ],
        UpDownMetric => [MetricDef::up_down_counter("UpDownMetric").description("Test Up/Down Metric")]
            tags [("CounterName", TagValue::Str("UpDownMetric"))],
        HistogramMetric => [MetricDef::histogram("HistogramMetric").description("Test Histogram Metric")],
        EverythingMetric => [
            MetricDef::counter("EverythingCounterMetric")
                .description("Test Everything Counter Metric")
                .required_tags(&["CounterName"]),
            MetricDef::up_down_counter("EverythingUpDownMetric").description("Test Everything Up/Down Metric"),
            MetricDef::histogram("EverythingHistogramMetric").description("Test Everything Histogram Metric"),
        ] tags [("EverythingMetric", TagValue::Bool(true))],
    }
}

metric_keys! {
    /// Same shape as [`Everything`] without any required tags.
    pub enum Floats {
        meter: MeterDef::new("My.Meter.Namespace").version("beta-1.0").element_type(ElementType::F32);
        CounterMetric => [MetricDef::counter("CounterMetric").description("Test Counter Metric").unit("MadeUpUnit")],
        UpDownMetric => [MetricDef::up_down_counter("UpDownMetric").description("Test Up/Down Metric")],
        HistogramMetric => [MetricDef::histogram("HistogramMetric").description("Test Histogram Metric")],
        EverythingMetric => [
            MetricDef::counter("EverythingCounterMetric").description("Test Everything Counter Metric"),
            MetricDef::up_down_counter("EverythingUpDownMetric").description("Test Everything Up/Down Metric"),
            MetricDef::histogram("EverythingHistogramMetric").description("Test Everything Histogram Metric"),
        ],
    }
}

metric_keys! {
    /// Accepts any element type, for exercising every [`crate::Amount`].
    pub enum Untyped {
        meter: MeterDef::new("untyped").any_element_type();
        Gauge => [MetricDef::up_down_counter("Gauge").description("Up/down gauge")],
        Hits => [MetricDef::counter("Hits")],
        Sizes => [MetricDef::histogram("Sizes").description("Size distribution")],
    }
}

metric_keys! {
    pub enum Duplicated {
        meter: MeterDef::new("dup").required_tags(&["Shared"]);
        Twice => [
            MetricDef::counter("First").description("kept").required_tags(&["Shared"]),
            MetricDef::counter("Second").description("dropped"),
        ],
        Empty,
    }
}

/// A key type nobody attached a meter to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unmetered {
    Monday,
    Tuesday,
}

impl MetricKey for Unmetered {
    const KEYS: &'static [Self] = &[Unmetered::Monday, Unmetered::Tuesday];

    fn meter() -> Option<MeterDef> {
        None
    }

    fn metrics(self) -> &'static [MetricDef] {
        const DEFS: &[MetricDef] = &[MetricDef::counter("Day").description("Days")];
        DEFS
    }
}

/// Collects formatted tracing output so tests can assert on log lines.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let logs = self.clone();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || logs.clone())
            .finish()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
