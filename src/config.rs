use core::fmt;

use crate::error::StatError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 2003;
pub const HOST_ENV: &str = "CARBON_HOST";
pub const PORT_ENV: &str = "CARBON_PORT";

/// Address of the Carbon collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}
impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Reads `CARBON_HOST` and `CARBON_PORT`, falling back to the defaults.
    pub fn from_env() -> Result<Self, StatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StatError> {
        let host = lookup(HOST_ENV)
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match lookup(PORT_ENV) {
            Some(port) => port.trim().parse::<u16>().map_err(|e| StatError::Config {
                key: PORT_ENV,
                value: port.clone(),
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };
        Ok(Self { host, port })
    }
}
impl Default for Destination {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}
impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
