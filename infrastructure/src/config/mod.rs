//! Configuration file loading for justice-aid
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `JUSTICE_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./justice-aid.toml` or `./.justice-aid.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/justice-aid/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAnalysisConfig, FileBackendConfig, FileConfig, FileProvidersConfig,
};
pub use loader::ConfigLoader;
