// ABOUTME: Resource quantity parsing and request/limit validation.
// ABOUTME: Accepts Kubernetes-style quantities like 500m, 2, 1Gi, 512Mi.

use super::error::ConfigError;
use serde::Deserialize;
use std::fmt;

/// A resource quantity, kept in its original spelling for rendering but
/// parsed to a scaled integer (units of 1/1000) for comparison.
#[derive(Debug, Clone)]
pub struct Quantity {
    raw: String,
    millis: u64,
}

// Equality and ordering compare the scaled value, not the spelling:
// "1000m" and "1" are the same quantity.
impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.millis == other.millis
    }
}

impl Eq for Quantity {}

impl Quantity {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(ConfigError::Quantity("empty quantity".to_string()));
        }

        let (digits, multiplier): (&str, u64) = if let Some(d) = raw.strip_suffix("Ki") {
            (d, 1024 * 1000)
        } else if let Some(d) = raw.strip_suffix("Mi") {
            (d, 1024 * 1024 * 1000)
        } else if let Some(d) = raw.strip_suffix("Gi") {
            (d, 1024 * 1024 * 1024 * 1000)
        } else if let Some(d) = raw.strip_suffix("Ti") {
            (d, 1024 * 1024 * 1024 * 1024 * 1000)
        } else if let Some(d) = raw.strip_suffix('K') {
            (d, 1_000 * 1000)
        } else if let Some(d) = raw.strip_suffix('M') {
            (d, 1_000_000 * 1000)
        } else if let Some(d) = raw.strip_suffix('G') {
            (d, 1_000_000_000 * 1000)
        } else if let Some(d) = raw.strip_suffix('m') {
            (d, 1)
        } else {
            (raw, 1000)
        };

        let value: u64 = digits
            .parse()
            .map_err(|_| ConfigError::Quantity(raw.to_string()))?;

        let millis = value
            .checked_mul(multiplier)
            .ok_or_else(|| ConfigError::Quantity(format!("{raw} overflows")))?;

        Ok(Self {
            raw: raw.to_string(),
            millis,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.millis.cmp(&other.millis)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Quantity::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// CPU and memory for one side (requests or limits).
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceSet {
    pub cpu: Quantity,
    pub memory: Quantity,
}

/// Requests and limits for the workload's container.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesConfig {
    pub requests: ResourceSet,
    pub limits: ResourceSet,
}

impl ResourcesConfig {
    /// Limits below requests are unschedulable; reject them up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.cpu < self.requests.cpu {
            return Err(ConfigError::LimitBelowRequest {
                resource: "cpu",
                request: self.requests.cpu.to_string(),
                limit: self.limits.cpu.to_string(),
            });
        }
        if self.limits.memory < self.requests.memory {
            return Err(ConfigError::LimitBelowRequest {
                resource: "memory",
                request: self.requests.memory.to_string(),
                limit: self.limits.memory.to_string(),
            });
        }
        Ok(())
    }
}
