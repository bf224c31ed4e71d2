use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::json_store::default_data_dir;

pub const MAX_PRACTICE_QUESTIONS: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_practice_questions")]
    pub practice_questions: usize,
    #[serde(default = "default_confirm_reset")]
    pub confirm_reset: bool,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}
fn default_practice_questions() -> usize {
    5
}
fn default_confirm_reset() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            data_dir: default_data_dir_string(),
            practice_questions: default_practice_questions(),
            confirm_reset: default_confirm_reset(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Store a new theme choice. Only the theme changes in the saved file;
    /// command-line overrides held in memory are never written.
    pub fn save_theme(theme: &str) -> Result<()> {
        Self::save_theme_to(&Self::config_path(), theme)
    }

    pub fn save_theme_to(path: &Path, theme: &str) -> Result<()> {
        let mut saved = Self::load_from(path)?;
        saved.theme = theme.to_string();
        saved.save_to(path)
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("alquenos")
            .join("config.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Clamp numeric settings and fall back to the default theme when the
    /// configured one is not available. Call after deserialization.
    pub fn validate(&mut self, available_themes: &[String]) {
        self.practice_questions = self.practice_questions.clamp(1, MAX_PRACTICE_QUESTIONS);
        if !available_themes.iter().any(|t| *t == self.theme) {
            self.theme = default_theme();
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir_string();
        }
    }
}
