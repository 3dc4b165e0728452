use std::{collections::hash_map::Entry, collections::HashMap, fmt, marker::PhantomData};

use smallvec::SmallVec;

use crate::{
    backend::{
        Counter, Histogram, InstrumentDescriptor, Meter, MeterDescriptor, MeterProvider,
        UpDownCounter,
    },
    metadata::{extract, InstrumentInfo},
    metrics::{InstrumentKind, MeterDef, MetricKey},
    utils::BuildSeededHasher,
    Amount, Error,
};

/// A live instrument handed back by the backend.
pub(crate) enum Instrument {
    Counter(Box<dyn Counter>),
    UpDownCounter(Box<dyn UpDownCounter>),
    Histogram(Box<dyn Histogram>),
}

impl Instrument {
    fn create(
        meter: &dyn Meter,
        kind: InstrumentKind,
        descriptor: &InstrumentDescriptor<'_>,
    ) -> Result<Self, Error> {
        Ok(match kind {
            InstrumentKind::Counter => Instrument::Counter(meter.counter(descriptor)?),
            InstrumentKind::UpDownCounter => {
                Instrument::UpDownCounter(meter.up_down_counter(descriptor)?)
            }
            InstrumentKind::Histogram => Instrument::Histogram(meter.histogram(descriptor)?),
        })
    }
}

/// The instruments for every metric declared on `K`, and the entry point for
/// recording against them.
///
/// Building a registry is a fairly heavy weight operation: the metadata on `K`
/// is read, the meter is created and every instrument is created up front. We
/// pay that cost once so that every call after is a lookup in an immutable map
/// followed by a call into the backend, with no locking in between.
///
/// `V` is the numeric type amounts are recorded as, `i64` unless the meter
/// declares otherwise.
pub struct Registry<K: MetricKey, V: Amount = i64> {
    meter_def: MeterDef,
    meter: Box<dyn Meter>,
    pub(crate) definitions: Vec<InstrumentInfo<K>>,
    pub(crate) instruments: Vec<Instrument>,
    index: HashMap<(K, InstrumentKind), usize, BuildSeededHasher>,
    _amount: PhantomData<fn() -> V>,
}

impl<K: MetricKey, V: Amount> Registry<K, V> {
    /// Build a registry for `K`, creating its meter and instruments through
    /// `provider`.
    ///
    /// This is all or nothing. On failure the error is logged, any meter that
    /// was already created is shut down, and nothing is returned.
    pub fn new<P: MeterProvider + ?Sized>(provider: &P) -> Result<Self, Error> {
        Self::build(provider).inspect_err(|e| {
            tracing::error!(
                message = "unable to initialize metrics registry",
                key_type = K::type_name(),
                error = %e
            );
        })
    }

    fn build<P: MeterProvider + ?Sized>(provider: &P) -> Result<Self, Error> {
        let (meter_def, infos) = extract::<K>()?;
        if let Some(declared) = meter_def.element_type {
            if declared != V::ELEMENT_TYPE {
                return Err(Error::ElementTypeMismatch {
                    key_type: K::type_name(),
                    declared,
                    configured: V::ELEMENT_TYPE,
                });
            }
        }
        // Types outside the built-in family must bring their own policy, find
        // out now rather than on the first call.
        V::resolve(None, false)?;

        let meter = provider.meter(&MeterDescriptor {
            name: meter_def.name,
            version: meter_def.version,
            tags: meter_def.tags,
        })?;
        tracing::debug!(
            message = "created meter",
            name = meter_def.name,
            version = meter_def.version,
            element_type = %V::ELEMENT_TYPE
        );

        let mut registry = Self {
            meter_def,
            meter,
            definitions: Vec::with_capacity(infos.len()),
            instruments: Vec::with_capacity(infos.len()),
            index: HashMap::with_capacity_and_hasher(infos.len(), BuildSeededHasher),
            _amount: PhantomData,
        };
        for info in infos {
            registry.register(info)?;
        }
        Ok(registry)
    }

    /// Create the instrument for `info` unless its `(key, kind)` pair is
    /// already registered, in which case the first registration wins.
    fn register(&mut self, info: InstrumentInfo<K>) -> Result<(), Error> {
        let slot = match self.index.entry((info.key(), info.kind())) {
            Entry::Occupied(_) => {
                tracing::debug!(
                    message = "ignoring duplicate instrument",
                    name = info.name(),
                    kind = %info.kind()
                );
                return Ok(());
            }
            Entry::Vacant(slot) => slot,
        };
        let instrument = Instrument::create(
            self.meter.as_ref(),
            info.kind(),
            &InstrumentDescriptor {
                name: info.name(),
                unit: info.unit(),
                description: info.description(),
                tags: info.tags(),
                element_type: V::ELEMENT_TYPE,
            },
        )?;
        tracing::debug!(
            message = "created instrument",
            name = info.name(),
            kind = %info.kind()
        );
        slot.insert(self.definitions.len());
        self.definitions.push(info);
        self.instruments.push(instrument);
        Ok(())
    }

    /// Namespace metadata the registry was built from.
    pub fn meter_def(&self) -> &MeterDef {
        &self.meter_def
    }

    /// Every registered instrument, in registration order.
    pub fn definitions(&self) -> &[InstrumentInfo<K>] {
        &self.definitions
    }

    pub fn definition(&self, key: K, kind: InstrumentKind) -> Option<&InstrumentInfo<K>> {
        self.position(key, kind).map(|index| &self.definitions[index])
    }

    /// The kinds of instrument registered for `key`, in registration order.
    pub fn kinds(&self, key: K) -> SmallVec<[InstrumentKind; 3]> {
        self.definitions
            .iter()
            .filter(|info| info.key() == key)
            .map(|info| info.kind())
            .collect()
    }

    pub(crate) fn position(&self, key: K, kind: InstrumentKind) -> Option<usize> {
        self.index.get(&(key, kind)).copied()
    }
}

impl<K: MetricKey, V: Amount> Drop for Registry<K, V> {
    fn drop(&mut self) {
        tracing::debug!(message = "shutting down meter", name = self.meter_def.name);
        self.meter.shutdown();
    }
}

impl<K: MetricKey, V: Amount> fmt::Debug for Registry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("meter", &self.meter_def.name)
            .field("element_type", &V::ELEMENT_TYPE)
            .field("definitions", &self.definitions)
            .finish()
    }
}
