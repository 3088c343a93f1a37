//! Configuration for building and navigating doc trees.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{DocTreeError, Result};
use crate::navigator::DEFAULT_DEPTH_LIMIT;
use crate::relay::DEFAULT_MAX_TOKENS;
use crate::search::DEFAULT_EXCERPT_CHARS;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DOC_TREE_CONFIG";

/// Navigation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Levels returned below a resolved node.
    pub depth_limit: usize,

    /// Token budget for one relayed response.
    pub max_tokens_per_response: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            depth_limit: DEFAULT_DEPTH_LIMIT,
            max_tokens_per_response: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum characters in a content excerpt.
    pub excerpt_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

/// Project layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root holding `<repo>/<source>/` artifact directories.
    pub data_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    pub navigator: NavigatorConfig,
    pub search: SearchConfig,
    pub project: ProjectConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    navigator: Option<NavigatorFileSection>,
    search: Option<SearchFileSection>,
    project: Option<ProjectFileSection>,
}

#[derive(Debug, Deserialize)]
struct NavigatorFileSection {
    depth_limit: Option<usize>,
    max_tokens_per_response: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchFileSection {
    excerpt_chars: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ProjectFileSection {
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DOC_TREE_DEPTH_LIMIT, DOC_TREE_MAX_TOKENS, DOC_TREE_DATA_DIR)
    /// 2. Config file ($DOC_TREE_CONFIG or ~/.config/doc-tree/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Override values from environment-style lookups.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(depth) = lookup("DOC_TREE_DEPTH_LIMIT") {
            match depth.trim().parse() {
                Ok(depth) => self.navigator.depth_limit = depth,
                Err(_) => warn!(value = %depth, "Ignoring invalid DOC_TREE_DEPTH_LIMIT"),
            }
        }

        if let Some(tokens) = lookup("DOC_TREE_MAX_TOKENS") {
            match tokens.trim().parse() {
                Ok(tokens) => self.navigator.max_tokens_per_response = tokens,
                Err(_) => warn!(value = %tokens, "Ignoring invalid DOC_TREE_MAX_TOKENS"),
            }
        }

        if let Some(data_dir) = lookup("DOC_TREE_DATA_DIR") {
            self.project.data_dir = PathBuf::from(data_dir);
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocTreeError::io(path, e))?;

        let file_config: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| DocTreeError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(navigator) = file_config.navigator {
            if let Some(depth_limit) = navigator.depth_limit {
                config.navigator.depth_limit = depth_limit;
            }
            if let Some(max_tokens) = navigator.max_tokens_per_response {
                config.navigator.max_tokens_per_response = max_tokens;
            }
        }

        if let Some(search) = file_config.search {
            if let Some(excerpt_chars) = search.excerpt_chars {
                config.search.excerpt_chars = excerpt_chars;
            }
        }

        if let Some(project) = file_config.project {
            if let Some(data_dir) = project.data_dir {
                config.project.data_dir = data_dir;
            }
        }

        Ok(config)
    }

    /// Get the config file path: `$DOC_TREE_CONFIG`, else the platform default.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", "doc-tree")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate configured limits.
    pub fn validate(&self) -> Result<()> {
        if self.navigator.max_tokens_per_response == 0 {
            return Err(DocTreeError::Config(
                "navigator.max_tokens_per_response must be greater than zero. Set DOC_TREE_MAX_TOKENS or fix the config file.".to_string(),
            ));
        }

        if self.search.excerpt_chars == 0 {
            return Err(DocTreeError::Config(
                "search.excerpt_chars must be greater than zero.".to_string(),
            ));
        }

        Ok(())
    }
}
