//! Bangumi 提取器

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use registry::Extractable;
use scraper::{ElementRef, Html, Selector};

use crate::error::*;
use crate::fetch::*;
use crate::models::*;
use crate::traits::{Context, Extractor};
use crate::utils::*;

// 封面尺寸
static COVER_SIZE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/cover/[lcmsg]/").unwrap());

static CHARACTER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div#columnInSubjectA > div.light_odd > div.clearit").unwrap()
});

/// 页面不存在标记
const NOT_FOUND_MARKER: &str = "呜咕，出错了";

/// Bangumi 提取器
#[derive(Extractable)]
#[extractor(site = Bangumi, pattern = r"(?:https?://)?(?:bgm\.tv|bangumi\.tv|chii\.in)/subject/(\d+)/?")]
pub struct BangumiExtractor;

impl BangumiExtractor {
    pub fn subject_link(sid: &str) -> String {
        format!("https://bgm.tv/subject/{sid}")
    }

    fn plan(sid: &str) -> FetchPlan {
        let link = Self::subject_link(sid);
        FetchPlan::new()
            .with("page", FetchRequest::get(&link))
            .with("characters", FetchRequest::get(format!("{link}/characters")))
    }

    /// 解析条目页与角色页
    pub fn parse(sid: &str, page: &str, characters: &str) -> Result<BangumiData> {
        if page.contains(NOT_FOUND_MARKER) {
            tracing::debug!(sid, "bangumi subject missing");
            return Err(Error::NotFound);
        }

        let document = Html::parse_document(page);
        let characters = Html::parse_document(characters);

        Ok(BangumiData {
            alt: Self::subject_link(sid),
            poster: Self::extract_poster(&document),
            story: Self::extract_story(&document),
            staff: Self::extract_staff(&document),
            cast: Self::extract_cast(&characters),
        })
    }

    /// 封面统一取大图
    fn extract_poster(document: &Html) -> Option<String> {
        let selector = Selector::parse("div#bangumiInfo a.thickbox.cover").ok()?;
        let href = document.select(&selector).next()?.value().attr("href")?;

        let href = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_string()
        };
        Some(COVER_SIZE_REGEX.replace(&href, "/cover/l/").into_owned())
    }

    fn extract_story(document: &Html) -> Option<String> {
        let selector = Selector::parse("div#subject_summary").ok()?;
        document.select(&selector).next().map(element_text).and_then(non_empty)
    }

    /// 信息栏全部条目, 保留空条目以维持位置
    fn extract_staff(document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("div#bangumiInfo ul#infobox li") else {
            return Vec::new();
        };

        document.select(&selector).map(element_text).collect()
    }

    /// 角色与声优, 形如 `角色: 声优1，声优2`
    fn extract_cast(document: &Html) -> Vec<String> {
        document
            .select(&CHARACTER_SELECTOR)
            .filter_map(Self::character_line)
            .collect()
    }

    fn character_line(tag: ElementRef<'_>) -> Option<String> {
        let h2_selector = Selector::parse("h2").ok()?;
        let tip_selector = Selector::parse("span.tip").ok()?;
        let link_selector = Selector::parse("a").ok()?;
        let actor_selector = Selector::parse("div.clearit > p").ok()?;
        let small_selector = Selector::parse("small").ok()?;

        let h2 = tag.select(&h2_selector).next()?;
        let name = h2
            .select(&tip_selector)
            .next()
            .or_else(|| h2.select(&link_selector).next())
            .map(element_text)?;
        let name = name.replacen('/', "", 1).trim().to_string();

        let actors = tag
            .select(&actor_selector)
            .filter_map(|p| {
                p.select(&small_selector)
                    .next()
                    .or_else(|| p.select(&link_selector).next())
                    .map(element_text)
                    .and_then(non_empty)
            })
            .collect::<Vec<_>>()
            .join("，");

        Some(format!("{name}: {actors}"))
    }
}

impl Extractor for BangumiExtractor {
    async fn extract<F: Fetcher>(&self, ctx: &Context<'_, F>, sid: &str) -> Result<MediaData> {
        let payloads = Self::plan(sid).execute(ctx.fetcher).await?;

        Self::parse(sid, payloads.text("page")?, payloads.text("characters")?)
            .map(MediaData::Bangumi)
    }
}

#[test]
fn test_extract() -> Result<()> {
    let page = r#"
        <html>
        <body>
            <div id="bangumiInfo">
                <div class="infobox">
                    <a href="//lain.bgm.tv/pic/cover/c/c2/0a/253_t3XLn.jpg" title="星际牛仔" class="thickbox cover">
                        <img src="//lain.bgm.tv/pic/cover/c/c2/0a/253_t3XLn.jpg" class="cover">
                    </a>
                </div>
                <ul id="infobox">
                    <li><span class="tip">中文名: </span>星际牛仔</li>
                    <li><span class="tip">话数: </span>26</li>
                    <li><span class="tip">放送开始: </span>1998年4月3日</li>
                    <li><span class="tip">放送星期: </span>星期五</li>
                    <li></li>
                    <li><span class="tip">导演: </span><a href="/person/1">渡辺信一郎</a></li>
                    <li><span class="tip">音乐: </span><a href="/person/2">菅野よう子</a></li>
                </ul>
            </div>
            <div id="subject_summary">2071年，人类已经移居到太阳系的各个角落。</div>
        </body>
        </html>"#;

    let characters = r#"
        <html>
        <body>
            <div id="columnInSubjectA">
                <div class="light_odd">
                    <div class="clearit">
                        <h2><a href="/character/1">スパイク・スピーゲル</a> <span class="tip">/ 史派克·斯皮格尔</span></h2>
                        <div class="actorBadge clearit"><p><a href="/person/3">山寺宏一</a><small>山寺宏一</small></p></div>
                    </div>
                </div>
                <div class="light_odd">
                    <div class="clearit">
                        <h2><a href="/character/2">フェイ・ヴァレンタイン</a></h2>
                        <div class="actorBadge clearit"><p><a href="/person/4">林原めぐみ</a></p></div>
                        <div class="actorBadge clearit"><p><a href="/person/5">Wendee Lee</a></p></div>
                    </div>
                </div>
            </div>
        </body>
        </html>"#;

    let data = BangumiExtractor::parse("253", page, characters)?;

    assert_eq!(data.alt, "https://bgm.tv/subject/253");
    assert_eq!(
        data.poster.as_deref(),
        Some("https://lain.bgm.tv/pic/cover/l/c2/0a/253_t3XLn.jpg")
    );
    assert_eq!(data.story.as_deref(), Some("2071年，人类已经移居到太阳系的各个角落。"));
    assert_eq!(data.staff.len(), 7);
    assert_eq!(data.staff[4], "");
    assert_eq!(data.staff[5], "导演: 渡辺信一郎");

    let format = crate::render::render(&MediaData::Bangumi(data.clone()));
    assert!(format.contains("[b]Staff: [/b]\n\n导演: 渡辺信一郎\n音乐: 菅野よう子\n\n"));
    assert_eq!(
        data.cast,
        vec![
            "史派克·斯皮格尔: 山寺宏一",
            "フェイ・ヴァレンタイン: 林原めぐみ，Wendee Lee",
        ]
    );

    Ok(())
}

#[test]
fn test_not_found() {
    let page = "<html><body><h2>呜咕，出错了</h2><div id=\"subject_summary\">x</div></body></html>";
    assert!(matches!(
        BangumiExtractor::parse("1", page, ""),
        Err(Error::NotFound)
    ));
}
