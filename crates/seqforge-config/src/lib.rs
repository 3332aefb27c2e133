//! Configuration system for SeqForge.
//!
//! Every threshold of the search engine is read from a flat set of dotted
//! keys ([`Properties`]). Properties can be written by hand, parsed from
//! `key=value` text, or loaded from TOML / YAML, where nested tables are
//! flattened into dotted keys.
//!
//! Typed views over the properties ([`SequenceConfig`], [`GreatDelugeConfig`],
//! ...) apply the documented defaults for missing keys and reject malformed
//! values up front.
//!
//! # Examples
//!
//! ```
//! use seqforge_config::{GreatDelugeConfig, Properties};
//!
//! let props = Properties::from_toml_str(r#"
//!     [GreatDeluge]
//!     CoolRate = 0.99
//!     UpperBoundRate = 1.1
//! "#).unwrap();
//!
//! let gd = GreatDelugeConfig::from_properties(&props).unwrap();
//! assert_eq!(gd.cool_rate, 0.99);
//! assert_eq!(gd.lower_bound_rate, 0.97);
//! ```
//!
//! Keys can also be set programmatically:
//!
//! ```
//! use seqforge_config::{keys, Properties, SequenceConfig, LearningMethod};
//!
//! let props = Properties::new().with(keys::SEQUENCE_LEARNING_METHOD, 0);
//! let seq = SequenceConfig::from_properties(&props).unwrap();
//! assert_eq!(seq.learning_method, LearningMethod::Count);
//! ```

pub mod keys;
mod properties;
mod search;

#[cfg(test)]
mod tests;

use thiserror::Error;

pub use properties::Properties;
pub use search::{
    ConstructionConfig, GeneralConfig, GreatDelugeConfig, HillClimberConfig, LearningMethod,
    SearchConfig, SelectionType, SequenceConfig, SimulatedAnnealingConfig, SolverConfig,
    TerminationConfig,
};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required property: {0}")]
    Missing(String),

    #[error("Malformed property {key} = {value:?}: expected {expected}")]
    Malformed {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown neighbour selector: {0}")]
    UnknownSelector(String),
}

impl From<ConfigError> for seqforge_core::SeqForgeError {
    fn from(err: ConfigError) -> Self {
        seqforge_core::SeqForgeError::Config(err.to_string())
    }
}
