//! Configuration module for schema-intel.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, GraphSettings, InferenceSettings, PathSettings, SamplingSettings, Settings,
    SettingsError, CONFIG_ENV_VAR,
};
