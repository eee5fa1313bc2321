//! Diff delivery configuration.

use arbor_value::{ValueError, ValueResult};
use serde::{Deserialize, Serialize};

/// Configuration for channel-based diff delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Changes buffered between producer and consumer. Zero is treated as
    /// one.
    pub channel_capacity: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

impl DiffConfig {
    /// Parse from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ValueResult<Self> {
        toml::from_str(s).map_err(|e| ValueError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(DiffConfig::default().channel_capacity, 64);
        assert_eq!(DiffConfig::from_toml_str("").unwrap(), DiffConfig::default());
    }

    #[test]
    fn parse_toml() {
        let c = DiffConfig::from_toml_str("channel_capacity = 8").unwrap();
        assert_eq!(c.channel_capacity, 8);
        assert!(matches!(
            DiffConfig::from_toml_str("channel_capacity = \"lots\""),
            Err(ValueError::Config(_))
        ));
    }

    #[test]
    fn serde_json_roundtrip() {
        let c = DiffConfig {
            channel_capacity: 3,
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(serde_json::from_str::<DiffConfig>(&json).unwrap(), c);
    }
}
