//! Steam 提取器

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

// 不存在的应用会被重定向到商店首页
static STORE_HOME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>(欢迎来到|Welcome to) Steam</title>").unwrap());

static TIMESTAMP_QUERY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)(\?t=\d+)?$").unwrap());

static DETAIL_COLON_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r":[ \t\n]+").unwrap());

static LINKBAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.+?url=(.+)$").unwrap());

static SCREENSHOT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+?url=(http.+?)\.[\dx]+(.+?)(\?t=\d+)?$").unwrap());

static BR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// 语言表中依次检查的列
const LANGUAGE_COLUMNS: [&str; 3] = ["界面", "完全音频", "字幕"];

const CHECK_MARK: char = '✔';

/// Steam 提取器
#[derive(Extractable)]
#[extractor(site = Steam, pattern = r"(?:https?://)?(?:store\.)?steam(?:powered|community)\.com/app/(\d+)/?")]
pub struct SteamExtractor;

impl SteamExtractor {
    pub fn store_link(sid: &str) -> String {
        format!("https://store.steampowered.com/app/{sid}/")
    }

    fn plan(sid: &str, headers: &[(String, String)]) -> FetchPlan {
        let page = headers.iter().fold(
            FetchRequest::get(format!("{}?l=schinese", Self::store_link(sid))),
            |req, (name, value)| req.header(name, value),
        );

        FetchPlan::new().with("page", page).with(
            "steamcn",
            FetchRequest::get(format!("https://steamdb.steamcn.com/app/{sid}/data.js?v=38")),
        )
    }

    /// 解析商店页与 SteamCN 的中文名
    pub fn parse(sid: &str, page: &str, steamcn: &str) -> Result<SteamData> {
        if STORE_HOME_REGEX.is_match(page) {
            tracing::debug!(sid, "steam app redirected to store home");
            return Err(Error::NotFound);
        }

        let steamcn = parse_jsonp(steamcn)?;
        let document = Html::parse_document(page);

        Ok(SteamData {
            steam_id: sid.to_string(),
            name: Self::extract_name(&document),
            name_chs: json_str(&steamcn, "name_cn"),
            poster: Self::extract_poster(&document),
            detail: Self::extract_detail(&document),
            linkbar: Self::extract_linkbar(&document),
            language: Self::extract_languages(&document),
            tags: Self::extract_texts(&document, "a.app_tag"),
            review: Self::extract_reviews(&document),
            descr: Self::extract_descr(&document),
            screenshot: Self::extract_screenshots(&document),
            sysreq: Self::extract_sysreq(&document),
        })
    }

    fn extract_texts(document: &Html, css: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(css) else {
            return Vec::new();
        };

        document
            .select(&selector)
            .map(element_text)
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn extract_name(document: &Html) -> Option<String> {
        ["div.apphub_AppName", r#"span[itemprop="name"]"#]
            .into_iter()
            .find_map(|css| Self::extract_texts(document, css).into_iter().next())
    }

    fn extract_poster(document: &Html) -> Option<String> {
        let selector = Selector::parse("img.game_header_image_full[src]").ok()?;
        let src = document.select(&selector).next()?.value().attr("src")?;
        non_empty(TIMESTAMP_QUERY_REGEX.replace(src, "${1}"))
    }

    fn extract_detail(document: &Html) -> Option<String> {
        let selector = Selector::parse("div.details_block").ok()?;
        let text = document.select(&selector).next()?.text().collect::<String>();
        let text = DETAIL_COLON_REGEX.replace_all(&text, ": ");

        non_empty(
            text.split('\n')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// 官网链接, 去除 Steam 的跳转前缀
    fn extract_linkbar(document: &Html) -> Option<String> {
        let selector = Selector::parse("a.linkbar").ok()?;
        let href = document
            .select(&selector)
            .find(|el| el.text().collect::<String>().contains("访问网站"))?
            .value()
            .attr("href")?;
        non_empty(LINKBAR_REGEX.replace(href, "${1}"))
    }

    fn extract_reviews(document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("div.user_reviews_summary_row") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|row| {
                let text = row.text().collect::<String>().replacen('：', ":", 1);
                non_empty(collapse_whitespace(&text))
            })
            .collect()
    }

    /// 支持的语言, 跳过表头后取前三行
    fn extract_languages(document: &Html) -> Vec<String> {
        let Ok(row_selector) = Selector::parse("table.game_language_options tr") else {
            return Vec::new();
        };
        let Ok(cell_selector) = Selector::parse("td") else {
            return Vec::new();
        };

        document
            .select(&row_selector)
            .filter(|row| {
                !row.value()
                    .attr("class")
                    .is_some_and(|class| class.contains("unsupported"))
            })
            .skip(1)
            .take(3)
            .map(|row| {
                let cells = row.select(&cell_selector).collect::<Vec<_>>();
                let language = cells.first().map(|c| element_text(*c)).unwrap_or_default();
                let columns = LANGUAGE_COLUMNS
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| {
                        cells
                            .get(i + 1)
                            .is_some_and(|c| c.text().any(|t| t.contains(CHECK_MARK)))
                    })
                    .map(|(_, col)| *col)
                    .collect::<Vec<_>>();

                if columns.is_empty() {
                    language
                } else {
                    format!("{language} ({})", columns.join(", "))
                }
            })
            .collect()
    }

    fn extract_descr(document: &Html) -> Option<String> {
        let selector = Selector::parse("div#game_area_description").ok()?;
        let html = document.select(&selector).next()?.inner_html();
        non_empty(html_to_bbcode(&html).replace("[h2]关于这款游戏[/h2]", ""))
    }

    /// 截图原图地址
    fn extract_screenshots(document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("div.screenshot_holder a") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| SCREENSHOT_REGEX.replace(href, "${1}${2}").into_owned())
            .collect()
    }

    fn extract_sysreq(document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("div.sysreq_contents > div.game_area_sys_req") else {
            return Vec::new();
        };

        document.select(&selector).map(Self::sysreq_block).collect()
    }

    /// 单个平台的配置需求, 最低与推荐之间空一行
    fn sysreq_block(block: ElementRef<'_>) -> String {
        let os = match block.value().attr("data-os") {
            Some("win") => "Windows",
            Some("mac") => "Mac OS X",
            Some("linux") => "SteamOS + Linux",
            Some(other) => other,
            None => "",
        };

        let inner = block.inner_html();
        let html = BR_REGEX.replace_all(&inner, "[br]");
        let text = decode_entities(&strip_tags(&html));

        let content = text
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
            .split("[br]")
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        format!("{os}\n{content}")
    }
}

impl Extractor for SteamExtractor {
    async fn extract<F: Fetcher>(&self, ctx: &Context<'_, F>, sid: &str) -> Result<MediaData> {
        let payloads = Self::plan(sid, ctx.config.steam_headers())
            .execute(ctx.fetcher)
            .await?;

        Self::parse(sid, payloads.text("page")?, payloads.text("steamcn")?).map(MediaData::Steam)
    }
}

#[cfg(test)]
pub(crate) const STORE_HOME_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>欢迎来到 Steam</title></head>
<body><div class="apphub_AppName">Featured</div></body></html>"#;

#[test]
fn test_extract() -> Result<()> {
    let page = r#"
        <html>
        <head><title>Dota 2 on Steam</title></head>
        <body>
            <div class="apphub_AppName">Dota 2</div>
            <img class="game_header_image_full" src="https://cdn.akamai.steamstatic.com/steam/apps/570/header.jpg?t=1639608963">
            <a class="app_tag" href="/tags/1">
                免费开玩
            </a>
            <a class="app_tag" href="/tags/2">MOBA</a>
            <div class="user_reviews_summary_row">
                <div class="subtitle column">最近评测：</div>
                <div class="summary column">特别好评</div>
            </div>
            <div class="details_block">
                <b>名称:</b> Dota 2<br>
                <b>类型:</b>
                <a href="/genre/1">动作</a><br>
                <b>开发者:</b>
                <a href="/developer/1">Valve</a><br>
            </div>
            <a class="linkbar" href="https://steamcommunity.com/linkfilter/?url=http://www.dota2.com/">访问网站</a>
            <a class="linkbar" href="https://steamcommunity.com/app/570/discussions/">查看讨论</a>
            <table class="game_language_options">
                <tr><th></th><th>界面</th><th>完全音频</th><th>字幕</th></tr>
                <tr><td>英语</td><td>✔</td><td>✔</td><td>✔</td></tr>
                <tr><td>简体中文</td><td>✔</td><td></td><td>✔</td></tr>
                <tr class="unsupported"><td>克林贡语</td><td></td><td></td><td></td></tr>
                <tr><td>日语</td><td></td><td></td><td></td></tr>
                <tr><td>德语</td><td>✔</td><td></td><td></td></tr>
            </table>
            <div id="game_area_description" class="game_area_description">
                <h2>关于这款游戏</h2>
                每天都有数百万玩家<strong>化身</strong>为一位 Dota 英雄。
            </div>
            <div class="screenshot_holder">
                <a href="https://steamcommunity.com/linkfilter/?url=https://cdn.akamai.steamstatic.com/steam/apps/570/ss_86d675fdc73ba10462abb8f5ece7791c5047072c.600x338.jpg?t=1639608963">shot</a>
            </div>
            <div class="sysreq_contents">
                <div class="game_area_sys_req" data-os="win">
                    <div class="game_area_sys_req_full"><ul><strong>最低配置:</strong><br><ul class="bb_ul"><li><strong>操作系统:</strong> Windows 7<br></li><li><strong>处理器:</strong> 双核<br></li></ul></ul></div>
                </div>
            </div>
        </body>
        </html>"#;
    let steamcn = r#"proc({"name_cn":"刀塔2","appid":570})"#;

    let data = SteamExtractor::parse("570", page, steamcn)?;

    assert_eq!(data.name.as_deref(), Some("Dota 2"));
    assert_eq!(data.name_chs.as_deref(), Some("刀塔2"));
    assert_eq!(
        data.poster.as_deref(),
        Some("https://cdn.akamai.steamstatic.com/steam/apps/570/header.jpg")
    );
    assert_eq!(data.tags, vec!["免费开玩", "MOBA"]);
    assert_eq!(data.review, vec!["最近评测: 特别好评"]);
    assert_eq!(
        data.detail.as_deref(),
        Some("名称: Dota 2\n类型: 动作\n开发者: Valve")
    );
    assert_eq!(data.linkbar.as_deref(), Some("http://www.dota2.com/"));
    assert_eq!(
        data.language,
        vec!["英语 (界面, 完全音频, 字幕)", "简体中文 (界面, 字幕)", "日语"]
    );
    assert_eq!(
        data.descr.as_deref(),
        Some("每天都有数百万玩家[b]化身[/b]为一位 Dota 英雄。")
    );
    assert_eq!(
        data.screenshot,
        vec!["https://cdn.akamai.steamstatic.com/steam/apps/570/ss_86d675fdc73ba10462abb8f5ece7791c5047072c.jpg"]
    );
    assert_eq!(
        data.sysreq,
        vec!["Windows\n最低配置:\n操作系统: Windows 7\n处理器: 双核"]
    );

    Ok(())
}

#[test]
fn test_store_home_is_not_found() {
    assert!(matches!(
        SteamExtractor::parse("12345", STORE_HOME_PAGE, "not jsonp"),
        Err(Error::NotFound)
    ));
}
