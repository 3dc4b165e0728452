//! An in-memory backend that keeps every meter, instrument and measurement it
//! is handed so they can be inspected later. Handy in tests, and for checking
//! what a set of metric keys turns into without wiring up an exporter.

use std::sync::{
    atomic::{self, AtomicBool},
    Arc,
};

use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;

use crate::{
    backend::{
        BackendError, Counter, Histogram, InstrumentDescriptor, Meter, MeterDescriptor,
        MeterProvider, UpDownCounter,
    },
    metrics::{InstrumentKind, OwnedTagValue, Tag},
    ElementType, Number,
};

pub type OwnedTag = (String, OwnedTagValue);

fn own_tags(tags: &[Tag<'_>]) -> Vec<OwnedTag> {
    tags.iter()
        .map(|(name, value)| (name.to_string(), OwnedTagValue::from(*value)))
        .collect()
}

/// A single recorded value and the tags it was recorded with.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: Number,
    pub tags: Vec<OwnedTag>,
}

#[derive(Debug, Clone)]
pub struct MeterSnapshot {
    pub name: String,
    pub version: Option<String>,
    pub tags: Vec<OwnedTag>,
    pub shut_down: bool,
}

#[derive(Debug, Clone)]
pub struct InstrumentSnapshot {
    pub name: String,
    pub kind: InstrumentKind,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<OwnedTag>,
    pub element_type: ElementType,
    pub measurements: Vec<Measurement>,
}

#[derive(Debug)]
struct MeterState {
    name: String,
    version: Option<String>,
    tags: Vec<OwnedTag>,
    shut_down: AtomicBool,
}

impl MeterState {
    fn is_shut_down(&self) -> bool {
        self.shut_down.load(atomic::Ordering::Acquire)
    }
}

#[derive(Debug)]
struct InstrumentState {
    meter: Arc<MeterState>,
    name: String,
    kind: InstrumentKind,
    unit: Option<String>,
    description: Option<String>,
    tags: Vec<OwnedTag>,
    element_type: ElementType,
    measurements: Mutex<Vec<Measurement>>,
}

impl InstrumentState {
    fn push(&self, value: Number, tags: &[Tag<'_>]) {
        // Instruments die with their meter.
        if self.meter.is_shut_down() {
            return;
        }
        self.measurements.lock().push(Measurement {
            value,
            tags: own_tags(tags),
        });
    }
}

#[derive(Debug, Default)]
struct Shared {
    meters: DashMap<String, Arc<MeterState>>,
    instruments: DashMap<String, Arc<InstrumentState>>,
    failures: DashSet<String>,
}

/// A [`MeterProvider`] that records everything in memory. Clones share state.
#[derive(Debug, Default, Clone)]
pub struct MemoryProvider {
    shared: Arc<Shared>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to create the instrument called `name` from now on.
    pub fn fail_on(&self, name: impl Into<String>) {
        self.shared.failures.insert(name.into());
    }

    pub fn meter_snapshot(&self, name: &str) -> Option<MeterSnapshot> {
        self.shared.meters.get(name).map(|meter| MeterSnapshot {
            name: meter.name.clone(),
            version: meter.version.clone(),
            tags: meter.tags.clone(),
            shut_down: meter.is_shut_down(),
        })
    }

    pub fn instrument_snapshot(&self, name: &str) -> Option<InstrumentSnapshot> {
        self.shared
            .instruments
            .get(name)
            .map(|instrument| InstrumentSnapshot {
                name: instrument.name.clone(),
                kind: instrument.kind,
                unit: instrument.unit.clone(),
                description: instrument.description.clone(),
                tags: instrument.tags.clone(),
                element_type: instrument.element_type,
                measurements: instrument.measurements.lock().clone(),
            })
    }

    /// Every measurement recorded on the instrument called `name`, oldest
    /// first. Empty if there is no such instrument.
    pub fn measurements(&self, name: &str) -> Vec<Measurement> {
        self.shared
            .instruments
            .get(name)
            .map(|instrument| instrument.measurements.lock().clone())
            .unwrap_or_default()
    }

    /// Just the values of [`MemoryProvider::measurements`].
    pub fn values(&self, name: &str) -> Vec<Number> {
        self.measurements(name)
            .into_iter()
            .map(|measurement| measurement.value)
            .collect()
    }

    pub fn instrument_count(&self) -> usize {
        self.shared.instruments.len()
    }

    pub fn meter_count(&self) -> usize {
        self.shared.meters.len()
    }
}

impl MeterProvider for MemoryProvider {
    fn meter(&self, descriptor: &MeterDescriptor<'_>) -> Result<Box<dyn Meter>, BackendError> {
        let state = Arc::new(MeterState {
            name: descriptor.name.to_string(),
            version: descriptor.version.map(str::to_string),
            tags: own_tags(descriptor.tags),
            shut_down: AtomicBool::new(false),
        });
        self.shared
            .meters
            .insert(descriptor.name.to_string(), state.clone());
        Ok(Box::new(MemoryMeter {
            state,
            shared: self.shared.clone(),
        }))
    }
}

struct MemoryMeter {
    state: Arc<MeterState>,
    shared: Arc<Shared>,
}

impl MemoryMeter {
    fn new_instrument(
        &self,
        kind: InstrumentKind,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Arc<InstrumentState> {
        Arc::new(InstrumentState {
            meter: self.state.clone(),
            name: descriptor.name.to_string(),
            kind,
            unit: descriptor.unit.map(str::to_string),
            description: descriptor.description.map(str::to_string),
            tags: own_tags(descriptor.tags),
            element_type: descriptor.element_type,
            measurements: Mutex::new(Vec::new()),
        })
    }

    fn instrument(
        &self,
        kind: InstrumentKind,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<MemoryInstrument, BackendError> {
        if self.shared.failures.contains(descriptor.name) {
            return Err(BackendError::new(format!(
                "refusing to create instrument '{}'",
                descriptor.name
            )));
        }
        // Asking this meter for the same name twice hands back the first
        // instrument. An instrument left over from an earlier meter is replaced.
        let mut state = self
            .shared
            .instruments
            .entry(descriptor.name.to_string())
            .or_insert_with(|| self.new_instrument(kind, descriptor));
        if !Arc::ptr_eq(&state.meter, &self.state) {
            *state = self.new_instrument(kind, descriptor);
        }
        let state = state.clone();
        Ok(MemoryInstrument { state })
    }
}

impl Meter for MemoryMeter {
    fn counter(
        &self,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn Counter>, BackendError> {
        Ok(Box::new(self.instrument(InstrumentKind::Counter, descriptor)?))
    }

    fn up_down_counter(
        &self,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn UpDownCounter>, BackendError> {
        Ok(Box::new(
            self.instrument(InstrumentKind::UpDownCounter, descriptor)?,
        ))
    }

    fn histogram(
        &self,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn Histogram>, BackendError> {
        Ok(Box::new(self.instrument(InstrumentKind::Histogram, descriptor)?))
    }

    fn shutdown(&self) {
        self.state.shut_down.store(true, atomic::Ordering::Release);
    }
}

struct MemoryInstrument {
    state: Arc<InstrumentState>,
}

impl Counter for MemoryInstrument {
    fn add(&self, value: Number, tags: &[Tag<'_>]) {
        self.state.push(value, tags);
    }
}

impl UpDownCounter for MemoryInstrument {
    fn add(&self, value: Number, tags: &[Tag<'_>]) {
        self.state.push(value, tags);
    }
}

impl Histogram for MemoryInstrument {
    fn record(&self, value: Number, tags: &[Tag<'_>]) {
        self.state.push(value, tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TagValue;

    fn descriptor(name: &str) -> InstrumentDescriptor<'_> {
        InstrumentDescriptor {
            name,
            unit: Some("ms"),
            description: None,
            tags: &[("static", TagValue::I64(3))],
            element_type: ElementType::F64,
        }
    }

    #[test]
    fn records_measurements() -> anyhow::Result<()> {
        let provider = MemoryProvider::new();
        let meter = provider.meter(&MeterDescriptor {
            name: "test",
            version: Some("1"),
            tags: &[],
        })?;
        let histogram = meter.histogram(&descriptor("test.latency"))?;
        histogram.record(Number::F64(2.5), &[("route", TagValue::Str("/"))]);

        let snapshot = provider.instrument_snapshot("test.latency").unwrap();
        assert_eq!(snapshot.kind, InstrumentKind::Histogram);
        assert_eq!(snapshot.unit.as_deref(), Some("ms"));
        assert_eq!(
            snapshot.tags,
            [("static".to_string(), OwnedTagValue::I64(3))]
        );
        assert_eq!(
            snapshot.measurements,
            [Measurement {
                value: Number::F64(2.5),
                tags: vec![("route".to_string(), OwnedTagValue::Str("/".to_string()))],
            }]
        );
        assert_eq!(provider.meter_snapshot("test").unwrap().version.as_deref(), Some("1"));
        Ok(())
    }

    #[test]
    fn shutdown_stops_recording() -> anyhow::Result<()> {
        let provider = MemoryProvider::new();
        let meter = provider.meter(&MeterDescriptor {
            name: "test",
            version: None,
            tags: &[],
        })?;
        let counter = meter.counter(&descriptor("test.hits"))?;
        counter.add(Number::F64(1.0), &[]);
        meter.shutdown();
        counter.add(Number::F64(1.0), &[]);

        assert!(provider.meter_snapshot("test").unwrap().shut_down);
        assert_eq!(provider.values("test.hits"), [Number::F64(1.0)]);
        Ok(())
    }

    #[test]
    fn new_meter_replaces_stale_instruments() -> anyhow::Result<()> {
        let provider = MemoryProvider::new();
        let test = MeterDescriptor {
            name: "test",
            version: None,
            tags: &[],
        };
        let first = provider.meter(&test)?;
        let old = first.counter(&descriptor("test.hits"))?;
        assert!(first.counter(&descriptor("test.hits")).is_ok());
        old.add(Number::F64(1.0), &[]);
        assert_eq!(provider.values("test.hits"), [Number::F64(1.0)]);
        first.shutdown();

        let second = provider.meter(&test)?;
        let counter = second.counter(&descriptor("test.hits"))?;
        counter.add(Number::F64(2.0), &[]);
        old.add(Number::F64(3.0), &[]);

        assert!(!provider.meter_snapshot("test").unwrap().shut_down);
        assert_eq!(provider.values("test.hits"), [Number::F64(2.0)]);
        assert_eq!(provider.instrument_count(), 1);
        Ok(())
    }

    #[test]
    fn fail_on_refuses_instrument() -> anyhow::Result<()> {
        let provider = MemoryProvider::new();
        provider.fail_on("test.broken");
        let meter = provider.meter(&MeterDescriptor {
            name: "test",
            version: None,
            tags: &[],
        })?;
        assert!(meter.up_down_counter(&descriptor("test.broken")).is_err());
        assert!(meter.up_down_counter(&descriptor("test.fine")).is_ok());
        assert_eq!(provider.instrument_count(), 1);
        Ok(())
    }
}
