//! Carbon plaintext lines: `<name> <value> <timestamp>`, newline separated.

use std::fmt::{self, Write};

use crate::timer::Aggregate;

pub const HEARTBEAT: &str = "heartbeat";
pub const TIMER_SUFFIXES: [&str; 3] = ["min", "avg", "max"];

/// Unix seconds shared by all lines of one packet.
pub type Timestamp = u64;

pub fn encode_line(
    wtr: &mut impl Write,
    namespace: &str,
    name: &str,
    suffix: Option<&str>,
    value: f64,
    timestamp: Timestamp,
) -> fmt::Result {
    if !namespace.is_empty() {
        write!(wtr, "{namespace}.")?;
    }
    wtr.write_str(name)?;
    if let Some(suffix) = suffix {
        write!(wtr, ".{suffix}")?;
    }
    write!(wtr, " {value} {timestamp}")
}

/// One datagram worth of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    buf: String,
    lines: usize,
    timestamp: Timestamp,
}
impl Packet {
    pub fn new(namespace: &str, timestamp: Timestamp) -> Self {
        let mut packet = Self {
            buf: String::new(),
            lines: 0,
            timestamp,
        };
        packet.push(namespace, HEARTBEAT, None, 0.0);
        packet
    }

    pub fn push_metric(&mut self, namespace: &str, name: &str, value: f64) {
        self.push(namespace, name, None, value);
    }
    pub fn push_timer(&mut self, namespace: &str, name: &str, aggregate: Aggregate) {
        let values = [aggregate.min, aggregate.avg, aggregate.max];
        for (suffix, value) in TIMER_SUFFIXES.into_iter().zip(values) {
            self.push(namespace, name, Some(suffix), value);
        }
    }

    fn push(&mut self, namespace: &str, name: &str, suffix: Option<&str>, value: f64) {
        if self.lines != 0 {
            self.buf.push('\n');
        }
        // Writing into a `String` never fails.
        let _ = encode_line(&mut self.buf, namespace, name, suffix, value, self.timestamp);
        self.lines += 1;
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
    pub fn len(&self) -> usize {
        self.lines
    }
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
    pub fn lines(&self) -> core::str::Lines<'_> {
        self.buf.lines()
    }
    pub fn as_str(&self) -> &str {
        &self.buf
    }
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }
}
impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}
