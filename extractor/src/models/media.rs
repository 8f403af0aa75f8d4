//! 各站点提取出的数据

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};

use crate::utils::group_thousands;

/// 站点数据, 序列化时平铺到记录顶层
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MediaData {
    Douban(DoubanData),
    Imdb(ImdbData),
    Bangumi(BangumiData),
    Steam(SteamData),
    Indienova(IndienovaData),
    Epic(EpicData),
}

/// 评分, 保留来源站点的分制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub votes: u64,
    pub text: String,
}

impl Rating {
    pub fn new(average: f64, votes: u64) -> Self {
        Self {
            average,
            votes,
            text: format!("{average}/10 from {} users", group_thousands(votes)),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubanData {
    pub chinese_title: String,
    pub foreign_title: Option<String>,
    pub aka: Vec<String>,
    pub trans_title: Vec<String>,
    pub this_title: Vec<String>,
    pub year: Option<String>,
    pub region: Vec<String>,
    pub genre: Vec<String>,
    pub language: Vec<String>,
    pub playdate: Vec<String>,
    pub episodes: Option<String>,
    pub duration: Option<String>,
    pub imdb_id: Option<String>,
    pub imdb_link: Option<String>,
    pub imdb_rating: Option<Rating>,
    pub douban_link: String,
    pub douban_rating: Option<Rating>,
    pub director: Vec<String>,
    pub writer: Vec<String>,
    pub cast: Vec<String>,
    pub tags: Vec<String>,
    pub introduction: Option<String>,
    pub awards: Option<String>,
    pub poster: Option<String>,
}

/// IMDb 人员 (仅 Person 类型)
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDate {
    pub country: String,
    pub date: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AkaTitle {
    pub country: String,
    pub title: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImdbData {
    pub imdb_id: String,
    pub imdb_link: String,
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub genre: Vec<String>,
    #[serde(rename = "contentRating")]
    pub content_rating: Option<String>,
    #[serde(rename = "datePublished")]
    pub date_published: Option<String>,
    pub year: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub poster: Option<String>,
    pub actors: Vec<Person>,
    pub directors: Vec<Person>,
    pub creators: Vec<Person>,
    pub keywords: Vec<String>,
    pub imdb_rating: Option<Rating>,
    pub metascore: Option<String>,
    pub reviews: Option<String>,
    pub critic: Option<String>,
    pub popularity: Option<String>,
    /// 页面 Details 区块, 保留页面顺序
    #[serde(default, with = "ordered_pairs")]
    pub details: Vec<(String, String)>,
    pub release_date: Vec<ReleaseDate>,
    pub aka: Vec<AkaTitle>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BangumiData {
    pub alt: String,
    pub poster: Option<String>,
    pub story: Option<String>,
    pub staff: Vec<String>,
    pub cast: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteamData {
    pub steam_id: String,
    pub name: Option<String>,
    pub name_chs: Option<String>,
    pub poster: Option<String>,
    pub detail: Option<String>,
    pub linkbar: Option<String>,
    pub language: Vec<String>,
    pub tags: Vec<String>,
    pub review: Vec<String>,
    pub descr: Option<String>,
    pub screenshot: Vec<String>,
    pub sysreq: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreLink {
    pub site: String,
    pub url: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndienovaData {
    pub poster: Option<String>,
    pub chinese_title: Option<String>,
    pub english_title: Option<String>,
    pub another_title: Option<String>,
    pub release_date: Option<String>,
    pub links: Vec<StoreLink>,
    pub intro: Option<String>,
    pub intro_detail: Vec<String>,
    pub descr: Option<String>,
    pub rate: Option<String>,
    pub dev: Vec<String>,
    #[serde(rename = "pub")]
    pub publisher: Vec<String>,
    pub screenshot: Vec<String>,
    pub cat: Vec<String>,
    pub level: Vec<String>,
    pub price: Vec<String>,
}

/// Epic 单个平台的配置需求, 最低与推荐两列来自同一组条目
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRequirements {
    pub system: String,
    pub minimum: Vec<String>,
    pub recommended: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicData {
    pub name: Option<String>,
    pub epic_link: Option<String>,
    pub desc: Option<String>,
    pub poster: Option<String>,
    pub screenshot: Vec<String>,
    pub language: Vec<String>,
    pub requirements: Vec<SystemRequirements>,
    pub level: Vec<String>,
}

/// 有序键值对, 序列化为 JSON 对象
mod ordered_pairs {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        pairs: &[(String, String)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(pairs.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    pairs.push(entry);
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}
