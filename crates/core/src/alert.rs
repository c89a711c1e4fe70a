//! Alert records produced by agents.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "Info",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Alert category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    /// Informational observation
    Info,
    /// Possible attack or misconfiguration
    Suspicious,
}

/// A single alert emitted by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub name: String,
    pub description: String,
    pub alert_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub metadata: BTreeMap<String, Value>,
}

impl Alert {
    /// Create an alert with empty metadata.
    pub fn new(
        alert_id: &str,
        name: &str,
        description: impl Into<String>,
        alert_type: AlertType,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.into(),
            alert_id: alert_id.to_string(),
            alert_type,
            severity,
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata entry.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Add a U256 metadata entry as a decimal string.
    pub fn with_u256(self, key: &str, value: U256) -> Self {
        self.with(key, value.to_string())
    }

    /// Add an address metadata entry in checksummed form.
    pub fn with_address(self, key: &str, value: Address) -> Self {
        self.with(key, value.to_checksum(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_alert_serialization() {
        let alert = Alert::new(
            "AAVE-TEST",
            "Test Alert",
            "something happened",
            AlertType::Suspicious,
            Severity::High,
        )
        .with("market", "MAIN")
        .with("difference", 0.5)
        .with_u256("price", U256::from(100u64))
        .with_address("oracle", Address::ZERO);

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "Suspicious");
        assert_eq!(json["severity"], "High");
        assert_eq!(json["alert_id"], "AAVE-TEST");
        assert_eq!(json["metadata"]["market"], "MAIN");
        assert_eq!(json["metadata"]["difference"], 0.5);
        assert_eq!(json["metadata"]["price"], "100");
        assert_eq!(
            json["metadata"]["oracle"],
            "0x0000000000000000000000000000000000000000"
        );
    }
}
