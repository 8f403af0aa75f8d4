//! 影视 / 游戏资源简介生成核心

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod config;
pub mod extractors;
mod factory;
pub mod fetch;
pub mod models;
mod pipeline;
pub mod render;
mod traits;
pub mod utils;

pub use config::{ApiKeyProvider, GenConfig};
pub use factory::SiteTable;
pub use fetch::{FetchPlan, FetchRequest, Fetcher, Payloads, Response};
pub use pipeline::Pipeline;
pub use traits::{Context, Extractor, Registered};

pub mod constants {
    //! 常量

    /// 资源不存在时的统一错误信息
    pub const NONE_EXIST_ERROR: &str = "The corresponding resource does not exist.";

    /// 豆瓣检测到异常请求时的错误信息
    pub const DOUBAN_BANNED_ERROR: &str = "GenHelp was temporarily banned by Douban, please wait.";

    /// 绕过 Steam 年龄检查与成人内容提示, 并强制中文
    pub const STEAM_AGE_GATE_COOKIES: &str = "lastagecheckage=1-January-1975; birthtime=157737601; mature_content=1; wants_mature_content=1; Steam_Language=schinese";
}

pub mod error {
    //! 错误类型

    use crate::constants::NONE_EXIST_ERROR;
    use crate::models::FailureKind;

    pub type Result<T> = std::result::Result<T, Error>;

    /// 通用错误
    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("no extractor found for input: {0}")]
        NoExtractor(String),
        #[error("{NONE_EXIST_ERROR}")]
        NotFound,
        #[error("{0}")]
        Blocked(String),
        #[error("Can't find this imdb_id({0}) in Douban.")]
        UnresolvedCrossReference(String),
        #[error("fetch error: {0}")]
        Fetch(String),
        #[error("json error: {0}")]
        Json(#[from] serde_json::Error),
        #[error("parse error: {0}")]
        Parse(String),
        #[error("missing landmark: {0}")]
        MissingLandmark(String),
    }

    impl Error {
        /// 对外可见的失败类别
        pub fn kind(&self) -> FailureKind {
            match self {
                Error::NotFound => FailureKind::NotFound,
                Error::Blocked(_) => FailureKind::TemporarilyBlocked,
                Error::UnresolvedCrossReference(_) => FailureKind::UnresolvedCrossReference,
                _ => FailureKind::InternalError,
            }
        }

        /// 写入记录 `error` 字段的信息
        pub fn message(&self) -> String {
            match self.kind() {
                FailureKind::InternalError => format!("Internal Error. Exception: {self}"),
                _ => self.to_string(),
            }
        }
    }
}
