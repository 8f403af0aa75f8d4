//! 简介生成运行环境支持

mod config;
mod fetcher;
mod keys;
mod route;

pub use config::{ConfigError, RuntimeConfig};
pub use fetcher::HttpFetcher;
pub use keys::RandomKeyRing;
pub use route::{RouteError, route};

use ptgen::models::Record;
use serde::Serialize;

/// 对外输出的主体
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Payload {
    Record(Record),
    Rejected {
        success: bool,
        error: String,
        format: String,
    },
}

/// 序列化给客户端的完整输出, 记录字段全部位于顶层
#[derive(Debug, Serialize)]
pub struct GenOutput {
    #[serde(flatten)]
    payload: Payload,
    pub copyright: String,
    pub version: String,
    /// 生成时间 (毫秒级时间戳)
    pub generate_at: i64,
}

impl GenOutput {
    pub fn new(record: Record, author: &str) -> Self {
        Self::wrap(Payload::Record(record), author)
    }

    /// 请求未进入提取流程时的输出
    pub fn rejected(error: impl ToString, author: &str) -> Self {
        Self::wrap(
            Payload::Rejected {
                success: false,
                error: error.to_string(),
                format: String::new(),
            },
            author,
        )
    }

    fn wrap(payload: Payload, author: &str) -> Self {
        Self {
            payload,
            copyright: format!("Powered by @{author}"),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generate_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match &self.payload {
            Payload::Record(record) => Some(record),
            Payload::Rejected { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.payload {
            Payload::Record(record) => record.error(),
            Payload::Rejected { error, .. } => Some(error.as_str()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.record().is_some_and(Record::is_success)
    }
}

impl From<Record> for GenOutput {
    fn from(record: Record) -> Self {
        Self::new(record, config::DEFAULT_AUTHOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptgen::error::Error;
    use ptgen::models::Site;

    #[test]
    fn test_envelope_failure() {
        let record = Record::failure(Site::Steam, "12345", &Error::NotFound);
        let value = serde_json::to_value(GenOutput::new(record, "someone")).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"], ptgen::constants::NONE_EXIST_ERROR);
        assert_eq!(value["format"], "");
        assert_eq!(value["site"], "steam");
        assert_eq!(value["sid"], "12345");
        assert_eq!(value["copyright"], "Powered by @someone");
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert!(value["generate_at"].as_i64().unwrap() > 0);
        assert_eq!(object.len(), 8);
    }

    #[test]
    fn test_envelope_rejected() {
        let output = GenOutput::rejected(RouteError::UnknownSite, "someone");
        let value = serde_json::to_value(&output).unwrap();

        assert!(!output.is_success());
        assert!(output.record().is_none());
        assert_eq!(output.error(), Some("Unknown value of key `site`."));
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Unknown value of key `site`.");
        assert_eq!(value["format"], "");
        assert!(value.get("site").is_none());
    }

    #[test]
    fn test_envelope_default_author() {
        let record = Record::failure(Site::Imdb, "tt1", &Error::NotFound);
        let output = GenOutput::from(record);

        assert_eq!(output.copyright, format!("Powered by @{}", config::DEFAULT_AUTHOR));
    }
}
