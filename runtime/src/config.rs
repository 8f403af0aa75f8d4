//! 运行配置

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ptgen::GenConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::RandomKeyRing;

pub(crate) const DEFAULT_AUTHOR: &str = "fltLi";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

/// 运行配置, 缺省字段取默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// 输出中 `copyright` 署名
    pub author: String,
    pub user_agent: String,
    /// 单个请求的超时秒数
    pub timeout_secs: u64,
    pub douban_api_keys: Vec<String>,
    /// 商店页请求附加的请求头, 排在年龄检查 Cookie 之后
    pub steam_headers: BTreeMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
            douban_api_keys: Vec::new(),
            steam_headers: BTreeMap::new(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        tracing::debug!(path = %path.display(), keys = config.douban_api_keys.len(), "runtime config loaded");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // 空文件视为全部缺省
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be positive".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn key_ring(&self) -> RandomKeyRing {
        RandomKeyRing::new(self.douban_api_keys.clone())
    }

    /// 构造核心配置
    pub fn gen_config(&self) -> GenConfig {
        self.steam_headers.iter().fold(
            GenConfig::new().with_douban_keys(self.key_ring()),
            |config, (name, value)| config.with_steam_header(name, value),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_yaml("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert!(config.douban_api_keys.is_empty());
    }

    #[test]
    fn test_partial_yaml() {
        let config = RuntimeConfig::from_yaml(
            "author: Someone\ndouban_api_keys:\n  - aaa\n  - bbb\n",
        )
        .unwrap();

        assert_eq!(config.author, "Someone");
        assert_eq!(config.douban_api_keys, vec!["aaa", "bbb"]);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            RuntimeConfig::from_yaml("timeout_secs: 0"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_yaml("timeout_secs: [1"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_gen_config() {
        let config = RuntimeConfig::from_yaml(
            "douban_api_keys: [k1]\nsteam_headers:\n  Accept-Language: zh-CN\n",
        )
        .unwrap()
        .gen_config();

        assert_eq!(config.douban_api_key().as_deref(), Some("k1"));
        let headers = config.steam_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].0, "Cookie");
        assert_eq!(headers[1], ("Accept-Language".to_string(), "zh-CN".to_string()));
    }

    #[test]
    fn test_missing_file() {
        let err = RuntimeConfig::load("/nonexistent/ptgen.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
