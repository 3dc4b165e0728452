use std::{
    fmt,
    sync::atomic::{self, AtomicBool},
};

use parking_lot::Mutex;

use crate::{
    metrics::{InstrumentKind, MetricKey, Tag},
    registry::Registry,
    Amount, Error,
};

/// Produces the tags for the decrement when a [`ScopedCounter`] is released.
pub type TagsProvider<'a> = Box<dyn FnOnce() -> Vec<Tag<'a>> + Send + 'a>;

/// Holds one unit of an up/down counter for as long as it lives.
///
/// The counter is increased when the handle is created and decreased exactly
/// once, either by [`ScopedCounter::release`] or when the handle is dropped.
#[must_use = "the counter is decreased again as soon as this is dropped"]
pub struct ScopedCounter<'a, K: MetricKey, V: Amount = i64> {
    registry: &'a Registry<K, V>,
    key: K,
    increase_tags: &'a [Tag<'a>],
    decrease_tags: Mutex<Option<TagsProvider<'a>>>,
    released: AtomicBool,
}

impl<'a, K: MetricKey, V: Amount> ScopedCounter<'a, K, V> {
    /// Decrease the counter. Only the first call does anything.
    pub fn release(&self) -> Result<(), Error> {
        if self.released.swap(true, atomic::Ordering::AcqRel) {
            return Ok(());
        }
        let provider = self.decrease_tags.lock().take();
        match provider {
            Some(provider) => {
                let tags = provider();
                self.registry
                    .decrease_kind(self.key, InstrumentKind::UpDownCounter, None, &tags)?;
            }
            None => {
                self.registry.decrease_kind(
                    self.key,
                    InstrumentKind::UpDownCounter,
                    None,
                    self.increase_tags,
                )?;
            }
        }
        Ok(())
    }

    pub fn is_released(&self) -> bool {
        self.released.load(atomic::Ordering::Acquire)
    }

    pub fn key(&self) -> K {
        self.key
    }
}

impl<K: MetricKey, V: Amount> Drop for ScopedCounter<'_, K, V> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(
                message = "failed to release scoped counter",
                metric = %self.key.display_name(),
                error = %e
            );
        }
    }
}

impl<K: MetricKey, V: Amount> fmt::Debug for ScopedCounter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedCounter")
            .field("key", &self.key)
            .field("released", &self.is_released())
            .finish()
    }
}

impl<K: MetricKey, V: Amount> Registry<K, V> {
    /// Increase the up/down counter for `key` now and hand back a guard that
    /// decreases it again on release.
    ///
    /// The decrement uses the tags returned by `decrease_tags` if given, the
    /// provider is only called at release time. Otherwise `increase_tags` are
    /// reused.
    pub fn scoped<'a>(
        &'a self,
        key: K,
        decrease_tags: Option<TagsProvider<'a>>,
        increase_tags: &'a [Tag<'a>],
    ) -> Result<ScopedCounter<'a, K, V>, Error> {
        if self
            .definition(key, InstrumentKind::UpDownCounter)
            .is_none()
        {
            return Err(Error::IncompatibleInstrument {
                metric: key.display_name().into_owned(),
                kind: InstrumentKind::UpDownCounter,
            });
        }
        self.increase_kind(key, InstrumentKind::UpDownCounter, None, increase_tags)?;
        Ok(ScopedCounter {
            registry: self,
            key,
            increase_tags,
            decrease_tags: Mutex::new(decrease_tags),
            released: AtomicBool::new(false),
        })
    }

    /// [`Registry::scoped`] using the same tags for both sides.
    pub fn scoped_with_tags<'a>(
        &'a self,
        key: K,
        tags: &'a [Tag<'a>],
    ) -> Result<ScopedCounter<'a, K, V>, Error> {
        self.scoped(key, None, tags)
    }
}
