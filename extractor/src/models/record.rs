//! 规范化记录

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Serialize, Serializer};

use super::{MediaData, Site};
use crate::error::Error;
use crate::render::render;

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    NotFound,
    TemporarilyBlocked,
    UnresolvedCrossReference,
    InternalError,
}

/// 失败信息
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// 一次提取的完整结果, 要么成功要么失败
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub site: Site,
    /// 调用方传入的原始 id
    pub sid: String,
    pub outcome: Result<MediaData, Failure>,
}

impl Record {
    pub fn success(site: Site, sid: impl Into<String>, data: MediaData) -> Self {
        Self {
            site,
            sid: sid.into(),
            outcome: Ok(data),
        }
    }

    pub fn failure(site: Site, sid: impl Into<String>, err: &Error) -> Self {
        Self {
            site,
            sid: sid.into(),
            outcome: Err(Failure {
                kind: err.kind(),
                message: err.message(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn data(&self) -> Option<&MediaData> {
        self.outcome.as_ref().ok()
    }

    pub fn failure_info(&self) -> Option<&Failure> {
        self.outcome.as_ref().err()
    }

    pub fn error(&self) -> Option<&str> {
        self.failure_info().map(|f| f.message.as_str())
    }

    /// 由站点数据生成的简介, 失败时为空
    pub fn format(&self) -> String {
        self.data().map(render).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct WireRecord<'a> {
    success: bool,
    error: Option<&'a str>,
    format: String,
    site: Site,
    sid: &'a str,
    #[serde(flatten)]
    data: Option<&'a MediaData>,
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRecord {
            success: self.is_success(),
            error: self.error(),
            format: self.format(),
            site: self.site,
            sid: &self.sid,
            data: self.data(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BangumiData;

    #[test]
    fn test_failure_wire_shape() {
        let record = Record::failure(Site::Steam, "12345", &Error::NotFound);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"], crate::constants::NONE_EXIST_ERROR);
        assert_eq!(value["format"], "");
        assert_eq!(value["site"], "steam");
        assert_eq!(value["sid"], "12345");
        assert_eq!(value.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_success_wire_shape() {
        let data = MediaData::Bangumi(BangumiData {
            alt: "https://bgm.tv/subject/1".to_string(),
            story: Some("story".to_string()),
            ..Default::default()
        });
        let record = Record::success(Site::Bangumi, "1", data);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["success"], true);
        assert!(value["error"].is_null());
        assert_eq!(value["alt"], "https://bgm.tv/subject/1");
        assert_eq!(value["story"], "story");
        assert_eq!(value["format"], record.format());
    }

    #[test]
    fn test_internal_error_message() {
        let record = Record::failure(Site::Imdb, "tt1", &Error::Fetch("timed out".into()));
        let failure = record.failure_info().unwrap();

        assert_eq!(failure.kind, FailureKind::InternalError);
        assert_eq!(failure.message, "Internal Error. Exception: fetch error: timed out");
    }
}
