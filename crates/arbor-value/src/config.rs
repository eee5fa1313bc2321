//! Decoder configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};

/// Default limit on nested values and type descriptors per decoder.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for value decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Re-derive and check every type descriptor the decoder meets, even on
    /// skip paths, and check that struct fields arrive in ascending order.
    /// Costs an allocation per skipped type.
    pub validate_types: bool,
    /// Deepest nesting of values and type descriptors a decoder accepts
    /// before failing with [`ValueError::NestingTooDeep`].
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            validate_types: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    /// A configuration that validates everything it decodes.
    pub fn validating() -> Self {
        Self {
            validate_types: true,
            ..Self::default()
        }
    }

    /// Parse from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ValueResult<Self> {
        toml::from_str(s).map_err(|e| ValueError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_does_not_validate() {
        assert!(!CodecConfig::default().validate_types);
        assert_eq!(CodecConfig::default().max_depth, DEFAULT_MAX_DEPTH);
        assert!(CodecConfig::validating().validate_types);
    }

    #[test]
    fn parse_toml() {
        let c = CodecConfig::from_toml_str("validate_types = true").unwrap();
        assert_eq!(c, CodecConfig::validating());
        let c = CodecConfig::from_toml_str("max_depth = 16").unwrap();
        assert_eq!(c.max_depth, 16);
        assert!(!c.validate_types);
    }

    #[test]
    fn empty_toml_takes_defaults() {
        assert_eq!(CodecConfig::from_toml_str("").unwrap(), CodecConfig::default());
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = CodecConfig::from_toml_str("validate_types = 3").unwrap_err();
        assert!(matches!(err, ValueError::Config(_)));
    }

    #[test]
    fn serde_json_roundtrip() {
        let c = CodecConfig::validating();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(serde_json::from_str::<CodecConfig>(&json).unwrap(), c);
    }
}
