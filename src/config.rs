use crate::error::{OptimizerError, Result};
use salon_optimizer_common::{OptimizationMethod, MAX_UPLOAD_BYTES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 環境変数でサーバーURLを上書き
pub const SERVER_URL_ENV: &str = "SALON_OPTIMIZER_URL";

const DEFAULT_SERVER_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub timeout_seconds: u64,
    pub default_method: OptimizationMethod,
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            // 最適化は数分かかることがある
            timeout_seconds: 600,
            default_method: OptimizationMethod::Greedy,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| OptimizerError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("salon-optimizer").join("config.json"))
    }

    /// 接続先サーバー
    pub fn server_url(&self) -> String {
        // 環境変数を優先
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                return url.trim().trim_end_matches('/').to_string();
            }
        }

        self.server_url.trim_end_matches('/').to_string()
    }

    pub fn set_server_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(OptimizerError::Config(format!(
                "URLは http:// または https:// で始めてください: {}",
                url
            )));
        }
        self.server_url = url;
        self.save()
    }
}
