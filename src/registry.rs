use std::{
    collections::{btree_map, BTreeMap},
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    codec::{Packet, Timestamp},
    config::Destination,
    error::StatError,
    exporter::{Exporter, UdpExporter},
    metric::Metric,
    timer::{Timer, Wrapper},
    MetricName,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Metric,
    Timer,
}
impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Metric => "metric",
            Self::Timer => "timer",
        };
        f.write_str(kind)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Metric(Metric),
    Timer(Timer),
}
impl Entry {
    fn kind(&self) -> EntryKind {
        match self {
            Self::Metric(_) => EntryKind::Metric,
            Self::Timer(_) => EntryKind::Timer,
        }
    }

    fn reset_unless_accumulating(&self) {
        match self {
            Self::Metric(metric) if !metric.accumulate() => metric.reset(),
            Self::Timer(timer) if !timer.accumulate() => timer.reset(),
            _ => (),
        }
    }
}

/// Named counters and timers flushed together as one Carbon packet.
///
/// Entries are created on first use and live as long as the registry. Names
/// are bound to one kind for good: asking for a timer under a counter's name
/// fails with [`StatError::KindMismatch`].
///
/// ```no_run
/// use carbonstat::{Destination, Registry, UdpExporter};
///
/// let mut stat = Registry::new(Destination::from_env()?, UdpExporter::new());
/// stat.metric("jobs.done")?.add(1.0)?;
/// {
///     let _timing = stat.timer("jobs.run")?.scope()?;
///     // work
/// }
/// stat.send()?;
/// # Ok::<(), carbonstat::StatError>(())
/// ```
#[derive(Debug)]
pub struct Registry<E = UdpExporter> {
    destination: Destination,
    namespace: String,
    entries: BTreeMap<MetricName, Entry>,
    exporter: E,
}

impl Registry<UdpExporter> {
    /// UDP to the destination resolved from the environment.
    pub fn from_env() -> Result<Self, StatError> {
        Ok(Self::new(Destination::from_env()?, UdpExporter::new()))
    }
}
impl Default for Registry<UdpExporter> {
    fn default() -> Self {
        Self::new(Destination::default(), UdpExporter::new())
    }
}

impl<E> Registry<E> {
    pub fn new(destination: Destination, exporter: E) -> Self {
        Self {
            destination,
            namespace: String::new(),
            entries: BTreeMap::new(),
            exporter,
        }
    }
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.set_namespace(namespace);
        self
    }

    /// Prefix for every line name of later packets; empty means none.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
    pub fn destination(&self) -> &Destination {
        &self.destination
    }
    pub fn exporter(&self) -> &E {
        &self.exporter
    }
    pub fn exporter_mut(&mut self) -> &mut E {
        &mut self.exporter
    }

    pub fn metric(&mut self, name: &str) -> Result<Metric, StatError> {
        match self.entry(name, EntryKind::Metric)? {
            Entry::Metric(metric) => Ok(metric.clone()),
            entry => Err(mismatch(name, entry.kind(), EntryKind::Metric)),
        }
    }

    pub fn timer(&mut self, name: &str) -> Result<Timer, StatError> {
        match self.entry(name, EntryKind::Timer)? {
            Entry::Timer(timer) => Ok(timer.clone()),
            entry => Err(mismatch(name, entry.kind(), EntryKind::Timer)),
        }
    }

    /// Higher-order helper timing every call of the callables it wraps
    /// under the timer `name`.
    pub fn wrapper(&mut self, name: &str) -> Result<Wrapper, StatError> {
        Ok(self.timer(name)?.wrapper())
    }

    pub fn kind_of(&self, name: &str) -> Option<EntryKind> {
        self.entries.get(name).map(Entry::kind)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&mut self, name: &str, kind: EntryKind) -> Result<&Entry, StatError> {
        match self.entries.entry(name.to_owned()) {
            btree_map::Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                if entry.kind() != kind {
                    return Err(mismatch(name, entry.kind(), kind));
                }
                Ok(&*entry)
            }
            btree_map::Entry::Vacant(vacant) => {
                tracing::trace!(name, %kind, "creating entry");
                let entry = match kind {
                    EntryKind::Metric => Entry::Metric(Metric::new(name.to_owned())),
                    EntryKind::Timer => Entry::Timer(Timer::new(name.to_owned())),
                };
                Ok(&*vacant.insert(entry))
            }
        }
    }

    /// Formats the current state without flushing it.
    ///
    /// Heartbeat first, then counters, then timers with at least one sample,
    /// each group in name order.
    pub fn packet(&self, timestamp: Timestamp) -> Packet {
        let mut packet = Packet::new(&self.namespace, timestamp);
        for (name, entry) in &self.entries {
            if let Entry::Metric(metric) = entry {
                packet.push_metric(&self.namespace, name, metric.value());
            }
        }
        for (name, entry) in &self.entries {
            if let Entry::Timer(timer) = entry {
                if let Some(aggregate) = timer.aggregate() {
                    packet.push_timer(&self.namespace, name, aggregate);
                }
            }
        }
        packet
    }

    fn reset(&self) {
        for entry in self.entries.values() {
            entry.reset_unless_accumulating();
        }
    }
}

impl<E: Exporter> Registry<E> {
    /// Flush with the current wall-clock time.
    pub fn send(&mut self) -> Result<(), StatError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| StatError::Clock)?
            .as_secs();
        self.send_at(timestamp)
    }

    /// Hands one packet stamped with `timestamp` to the exporter and resets
    /// every entry not marked as accumulating.
    ///
    /// State is reset whether or not the export succeeds; a failed packet is
    /// lost.
    pub fn send_at(&mut self, timestamp: Timestamp) -> Result<(), StatError> {
        let packet = self.packet(timestamp);
        let result = self.exporter.export(&packet, &self.destination);
        self.reset();
        match result {
            Ok(()) => {
                tracing::debug!(
                    destination = %self.destination,
                    lines = packet.len(),
                    bytes = packet.as_bytes().len(),
                    "flushed packet"
                );
                Ok(())
            }
            Err(source) => {
                tracing::debug!(
                    destination = %self.destination,
                    error = %source,
                    "could not send packet"
                );
                Err(StatError::Transport {
                    destination: self.destination.to_string(),
                    source,
                })
            }
        }
    }
}

fn mismatch(name: &str, registered: EntryKind, requested: EntryKind) -> StatError {
    StatError::KindMismatch {
        name: name.to_owned(),
        registered,
        requested,
    }
}
