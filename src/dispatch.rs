//! Increment and decrement calls on a [`Registry`].
//!
//! Every call runs through the same pipeline: work out the instrument kind if
//! the caller didn't name one, find the instrument, settle the amount, check
//! the required tags are present, and finally hand the value to the backend.

use smallvec::SmallVec;

use crate::{
    metrics::{InstrumentKind, MetricKey, Tag},
    registry::{Instrument, Registry},
    Amount, Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Increase,
    Decrease,
}

impl Operation {
    fn accepts(self, kind: InstrumentKind) -> bool {
        match self {
            Operation::Increase => true,
            Operation::Decrease => kind == InstrumentKind::UpDownCounter,
        }
    }
}

/// Names in `required` that none of `tags` carry, in order. Duplicates in
/// `required` are reported once per occurrence.
fn missing_tags(required: &[&'static str], tags: &[Tag<'_>]) -> Vec<&'static str> {
    required
        .iter()
        .filter(|name| !tags.iter().any(|(tag, _)| tag == *name))
        .copied()
        .collect()
}

impl<K: MetricKey, V: Amount> Registry<K, V> {
    /// Increase the only instrument registered for `key` by `amount`, or by
    /// one if no amount is given.
    ///
    /// Fails with [`Error::AmbiguousInstrument`] if `key` has more than one
    /// instrument; use [`Registry::increase_kind`] to pick one.
    pub fn increase(&self, key: K, amount: Option<V>, tags: &[Tag<'_>]) -> Result<&Self, Error> {
        let kind = self.infer_kind(key, Operation::Increase)?;
        self.increase_kind(key, kind, amount, tags)
    }

    /// Increase the `kind` instrument registered for `key`. Histograms record
    /// the amount instead of adding it.
    pub fn increase_kind(
        &self,
        key: K,
        kind: InstrumentKind,
        amount: Option<V>,
        tags: &[Tag<'_>],
    ) -> Result<&Self, Error> {
        let index = self.resolve(key, kind)?;
        let amount = V::resolve(amount, false)?.into_number();
        self.check_tags(index, tags)?;
        match &self.instruments[index] {
            Instrument::Counter(counter) => counter.add(amount, tags),
            Instrument::UpDownCounter(counter) => counter.add(amount, tags),
            Instrument::Histogram(histogram) => histogram.record(amount, tags),
        }
        Ok(self)
    }

    /// Decrease the up/down counter registered for `key` by `amount`, or by
    /// one if no amount is given.
    pub fn decrease(&self, key: K, amount: Option<V>, tags: &[Tag<'_>]) -> Result<&Self, Error> {
        let kind = self.infer_kind(key, Operation::Decrease)?;
        self.decrease_kind(key, kind, amount, tags)
    }

    /// Decrease the `kind` instrument registered for `key`. Only up/down
    /// counters can be decreased.
    pub fn decrease_kind(
        &self,
        key: K,
        kind: InstrumentKind,
        amount: Option<V>,
        tags: &[Tag<'_>],
    ) -> Result<&Self, Error> {
        let index = self.resolve(key, kind)?;
        let amount = V::resolve(amount, true)?.into_number();
        self.check_tags(index, tags)?;
        match &self.instruments[index] {
            Instrument::UpDownCounter(counter) => counter.add(amount, tags),
            Instrument::Counter(_) | Instrument::Histogram(_) => {
                return Err(Error::InvalidOperationForKind {
                    metric: key.display_name().into_owned(),
                    kind,
                })
            }
        }
        Ok(self)
    }

    fn infer_kind(&self, key: K, operation: Operation) -> Result<InstrumentKind, Error> {
        let kinds: SmallVec<[InstrumentKind; 3]> = self
            .kinds(key)
            .into_iter()
            .filter(|kind| operation.accepts(*kind))
            .collect();
        match kinds.as_slice() {
            [kind] => Ok(*kind),
            [] => {
                let metric = key.display_name().into_owned();
                Err(match operation {
                    Operation::Increase => Error::NoInstrument { metric },
                    Operation::Decrease => Error::NoCompatibleInstrument { metric },
                })
            }
            _ => Err(Error::AmbiguousInstrument {
                metric: key.display_name().into_owned(),
                kinds: kinds.into_vec(),
            }),
        }
    }

    fn resolve(&self, key: K, kind: InstrumentKind) -> Result<usize, Error> {
        self.position(key, kind)
            .ok_or_else(|| Error::InstrumentNotFound {
                metric: key.display_name().into_owned(),
                kind,
            })
    }

    fn check_tags(&self, index: usize, tags: &[Tag<'_>]) -> Result<(), Error> {
        let missing = missing_tags(self.definitions[index].required_tags(), tags);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingRequiredTags { missing })
        }
    }
}
