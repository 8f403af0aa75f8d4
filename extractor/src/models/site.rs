//! 支持的资源站点

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 资源站点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Douban,
    Imdb,
    Bangumi,
    Steam,
    Indienova,
    Epic,
}

impl Site {
    /// 链接识别时的尝试顺序
    pub const ALL: [Site; 6] = [
        Site::Douban,
        Site::Imdb,
        Site::Bangumi,
        Site::Steam,
        Site::Indienova,
        Site::Epic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Douban => "douban",
            Site::Imdb => "imdb",
            Site::Bangumi => "bangumi",
            Site::Steam => "steam",
            Site::Indienova => "indienova",
            Site::Epic => "epic",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::ALL
            .into_iter()
            .find(|site| site.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown site: {s}"))
    }
}
