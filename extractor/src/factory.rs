//! 站点识别

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use regex::Regex;

use crate::models::*;

/// 提取器注册项, 由 `#[derive(Extractable)]` 生成
#[derive(Clone, Debug)]
pub struct ExtractorRegistryItem {
    pub site: Site,
    pub pattern: &'static str,
}

/// 站点链接模式表, 按注册顺序尝试
#[derive(Clone, Debug)]
pub struct SiteTable {
    entries: Vec<(Site, Regex)>,
}

impl SiteTable {
    /// 编译全部注册的链接模式
    pub fn new() -> Self {
        // 模式已在派生宏中校验过, 编译不会失败
        let entries = crate::extractors::registry_items()
            .into_iter()
            .filter_map(|item| Regex::new(item.pattern).ok().map(|re| (item.site, re)))
            .collect();
        Self { entries }
    }

    /// 识别链接所属站点, 返回 (站点, 站点内 id)
    pub fn resolve(&self, input: &str) -> Option<(Site, String)> {
        self.entries.iter().find_map(|(site, re)| {
            re.captures(input)
                .and_then(|caps| caps.get(1))
                .map(|m| (*site, m.as_str().to_string()))
        })
    }

    /// 按尝试顺序列出站点
    pub fn sites(&self) -> Vec<Site> {
        self.entries.iter().map(|(site, _)| *site).collect()
    }
}

impl Default for SiteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        assert_eq!(SiteTable::new().sites(), Site::ALL.to_vec());
    }

    #[test]
    fn test_single_capture_group() {
        for (site, re) in SiteTable::new().entries {
            assert_eq!(re.captures_len(), 2, "{site}");
        }
    }

    #[test]
    fn test_resolve() {
        let table = SiteTable::new();
        let cases = [
            ("https://movie.douban.com/subject/1292052/", Site::Douban, "1292052"),
            ("https://www.douban.com/movie/1292052", Site::Douban, "1292052"),
            ("https://www.imdb.com/title/tt0133093/", Site::Imdb, "tt0133093"),
            ("imdb.com/title/tt0133093", Site::Imdb, "tt0133093"),
            ("https://bgm.tv/subject/253", Site::Bangumi, "253"),
            ("http://chii.in/subject/253/", Site::Bangumi, "253"),
            ("https://store.steampowered.com/app/570/Dota_2/", Site::Steam, "570"),
            ("https://steamcommunity.com/app/570", Site::Steam, "570"),
            ("https://indienova.com/game/celeste", Site::Indienova, "celeste"),
            (
                "https://www.epicgames.com/store/zh-CN/product/fortnite/home",
                Site::Epic,
                "fortnite",
            ),
        ];

        for (url, site, sid) in cases {
            assert_eq!(table.resolve(url), Some((site, sid.to_string())), "{url}");
        }
    }

    #[test]
    fn test_resolve_no_match() {
        let table = SiteTable::new();
        assert_eq!(table.resolve("https://www.themoviedb.org/movie/603"), None);
        assert_eq!(table.resolve("https://bgm.tv/person/1"), None);
        assert_eq!(table.resolve(""), None);
    }
}
