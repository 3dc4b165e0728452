//! Declarative metric keys.
//!
//! A closed set of metric keys is declared once, along with the meter they
//! belong to and the instruments backing each key. A [`Registry`] reads that
//! metadata, creates every instrument up front through a
//! [`MeterProvider`](backend::MeterProvider), and then dispatches increments
//! and decrements to them by key.
//!
//! ```
//! use metric_keys::{memory::MemoryProvider, metric_keys, MeterDef, MetricDef, Registry, TagValue};
//!
//! metric_keys! {
//!     pub enum Jobs {
//!         meter: MeterDef::new("Batch Runner").required_tags(&["queue"]);
//!         Started => [MetricDef::counter("Started").description("Jobs started")],
//!         Running => [MetricDef::up_down_counter("Running").description("Jobs in progress")],
//!     }
//! }
//!
//! # fn main() -> Result<(), metric_keys::Error> {
//! let provider = MemoryProvider::new();
//! let registry = Registry::<Jobs>::new(&provider)?;
//! let tags = [("queue", TagValue::Str("default"))];
//!
//! registry.increase(Jobs::Started, None, &tags)?;
//! {
//!     let _running = registry.scoped_with_tags(Jobs::Running, &tags)?;
//! }
//! assert_eq!(provider.values("batch.runner.started").len(), 1);
//! assert_eq!(provider.values("batch.runner.running").len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod dispatch;
mod error;
pub mod memory;
mod metadata;
mod metrics;
mod number;
mod registry;
mod scoped;
mod utils;

#[cfg(test)]
mod testing;

pub use error::Error;
pub use metadata::{extract, meter_name, InstrumentInfo};
pub use metrics::{InstrumentKind, MeterDef, MetricDef, MetricKey, OwnedTagValue, Tag, TagValue};
pub use number::{Amount, ElementType, Number};
pub use registry::Registry;
pub use scoped::{ScopedCounter, TagsProvider};
pub use utils::{camel_case, dot_notation};
