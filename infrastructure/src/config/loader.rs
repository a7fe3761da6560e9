//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["justice-aid.toml", ".justice-aid.toml"];
const ENV_PREFIX: &str = "JUSTICE_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `JUSTICE_*` environment variables, e.g. `JUSTICE_ANALYSIS__MODE=gemini`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./justice-aid.toml` or `./.justice-aid.toml`
    /// 4. Global config: `$XDG_CONFIG_HOME/justice-aid/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// The merged figment, before extraction
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("justice-aid").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used, highest priority first
    pub fn config_sources(config_path: Option<&Path>) -> Vec<(String, Option<PathBuf>)> {
        let mut sources = Vec::new();

        if let Some(path) = config_path {
            sources.push((
                "Explicit".to_string(),
                path.exists().then(|| path.to_path_buf()),
            ));
        }
        sources.push(("Project".to_string(), Self::project_config_path()));
        sources.push((
            "Global".to_string(),
            Self::global_config_path().filter(|p| p.exists()),
        ));
        sources
    }
}
