//! 提取器特型

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::config::GenConfig;
use crate::error::*;
use crate::fetch::Fetcher;
use crate::models::*;

/// 单次提取的上下文
pub struct Context<'a, F: Fetcher> {
    pub fetcher: &'a F,
    pub config: &'a GenConfig,
}

/// 提取器
#[allow(async_fn_in_trait)]
pub trait Extractor: Registered {
    /// 按站点 id 请求并解析资源, 返回站点数据
    async fn extract<F: Fetcher>(&self, ctx: &Context<'_, F>, sid: &str) -> Result<MediaData>;
}

/// 注册信息, 由 `#[derive(Extractable)]` 生成
pub trait Registered {
    /// 所属站点
    const SITE: Site;

    /// 识别站点链接的正则, 唯一捕获组为站点 id
    const PATTERN: &'static str;
}
