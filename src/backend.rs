//! The interface a telemetry backend implements so a [`Registry`] can create
//! and feed its instruments.
//!
//! [`Registry`]: crate::Registry

use thiserror::Error;

use crate::{metrics::Tag, ElementType, Number};

/// A backend refused to create a meter or an instrument.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Describes the meter a registry asks its provider for.
#[derive(Debug, Clone, Copy)]
pub struct MeterDescriptor<'a> {
    pub name: &'a str,
    pub version: Option<&'a str>,
    pub tags: &'a [Tag<'a>],
}

/// Describes a single instrument a registry asks its meter for.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentDescriptor<'a> {
    pub name: &'a str,
    pub unit: Option<&'a str>,
    pub description: Option<&'a str>,
    pub tags: &'a [Tag<'a>],
    /// Every measurement handed to the instrument uses this element type.
    pub element_type: ElementType,
}

/// Creates meters, the namespace level object instruments hang off.
pub trait MeterProvider {
    fn meter(&self, descriptor: &MeterDescriptor<'_>) -> Result<Box<dyn Meter>, BackendError>;
}

/// A namespace of instruments. Shutting the meter down releases every
/// instrument it created.
pub trait Meter: Send + Sync {
    fn counter(
        &self,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn Counter>, BackendError>;

    fn up_down_counter(
        &self,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn UpDownCounter>, BackendError>;

    fn histogram(
        &self,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn Histogram>, BackendError>;

    fn shutdown(&self);
}

/// A monotonically increasing sum.
pub trait Counter: Send + Sync {
    fn add(&self, value: Number, tags: &[Tag<'_>]);
}

/// A sum that can move in both directions.
pub trait UpDownCounter: Send + Sync {
    fn add(&self, value: Number, tags: &[Tag<'_>]);
}

/// Records a distribution of values.
pub trait Histogram: Send + Sync {
    fn record(&self, value: Number, tags: &[Tag<'_>]);
}

/// A provider whose instruments drop every measurement. Useful when metrics
/// are turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvider;

#[derive(Debug, Default, Clone, Copy)]
struct NoopInstrument;

impl MeterProvider for NoopProvider {
    fn meter(&self, _descriptor: &MeterDescriptor<'_>) -> Result<Box<dyn Meter>, BackendError> {
        Ok(Box::new(NoopInstrument))
    }
}

impl Meter for NoopInstrument {
    fn counter(
        &self,
        _descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn Counter>, BackendError> {
        Ok(Box::new(NoopInstrument))
    }

    fn up_down_counter(
        &self,
        _descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn UpDownCounter>, BackendError> {
        Ok(Box::new(NoopInstrument))
    }

    fn histogram(
        &self,
        _descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Box<dyn Histogram>, BackendError> {
        Ok(Box::new(NoopInstrument))
    }

    fn shutdown(&self) {}
}

impl Counter for NoopInstrument {
    fn add(&self, _value: Number, _tags: &[Tag<'_>]) {}
}

impl UpDownCounter for NoopInstrument {
    fn add(&self, _value: Number, _tags: &[Tag<'_>]) {}
}

impl Histogram for NoopInstrument {
    fn record(&self, _value: Number, _tags: &[Tag<'_>]) {}
}
