//! In-process counters and timers flushed to Carbon as one UDP datagram.
//!
//! A [`Registry`] owns named [`Metric`]s and [`Timer`]s. Each [`Registry::send`]
//! writes a heartbeat line plus one line per counter and three per active timer
//! (`.min`, `.avg`, `.max`), all sharing one timestamp, then resets every entry
//! that is not accumulating.

pub mod codec;
pub mod config;
pub mod error;
pub mod exporter;
pub mod metric;
pub mod registry;
pub mod timer;

pub use codec::{Packet, Timestamp};
pub use config::Destination;
pub use error::{Result, StatError};
pub use exporter::{Exporter, InMemExporter, UdpExporter};
pub use metric::Metric;
pub use registry::{EntryKind, Registry};
pub use timer::{Aggregate, Timer, TimerGuard, Wrapper};

/// Dotted metric path, e.g. `api.requests.count`.
pub type MetricName = String;
