//! 不可变配置

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::constants::STEAM_AGE_GATE_COOKIES;
use crate::factory::SiteTable;
use crate::models::Site;

/// 豆瓣 API key 来源, 每次提取调用一次
pub trait ApiKeyProvider: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

impl<F> ApiKeyProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn api_key(&self) -> Option<String> {
        self()
    }
}

/// 进程启动时构造一次, 以引用传入流水线
pub struct GenConfig {
    sites: SiteTable,
    steam_headers: Vec<(String, String)>,
    douban_keys: Box<dyn ApiKeyProvider>,
}

impl GenConfig {
    pub fn new() -> Self {
        Self {
            sites: SiteTable::new(),
            steam_headers: vec![("Cookie".to_string(), STEAM_AGE_GATE_COOKIES.to_string())],
            douban_keys: Box::new(|| None),
        }
    }

    pub fn with_douban_keys(mut self, provider: impl ApiKeyProvider + 'static) -> Self {
        self.douban_keys = Box::new(provider);
        self
    }

    pub fn with_steam_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.steam_headers.push((name.into(), value.into()));
        self
    }

    /// 识别链接所属站点
    pub fn select_site(&self, input: &str) -> Option<(Site, String)> {
        self.sites.resolve(input)
    }

    pub fn steam_headers(&self) -> &[(String, String)] {
        &self.steam_headers
    }

    pub fn douban_api_key(&self) -> Option<String> {
        self.douban_keys.api_key()
    }
}

impl Default for GenConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenConfig")
            .field("sites", &self.sites.sites())
            .field("steam_headers", &self.steam_headers)
            .finish_non_exhaustive()
    }
}
