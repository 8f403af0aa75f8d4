//! Indienova 提取器

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use registry::Extractable;
use scraper::{ElementRef, Html, Selector};

use crate::error::*;
use crate::fetch::*;
use crate::models::*;
use crate::traits::{Context, Extractor};
use crate::utils::*;

/// 页面不存在标记
const NOT_FOUND_MARKER: &str = "出现错误";

/// 标签区块末尾的展开按钮
const SHOW_ALL_TAG: &str = "查看全部 +";

/// Indienova 提取器
#[derive(Extractable)]
#[extractor(site = Indienova, pattern = r"(?:https?://)?indienova\.com/game/(\S+)")]
pub struct IndienovaExtractor;

impl IndienovaExtractor {
    fn plan(sid: &str) -> FetchPlan {
        FetchPlan::new().with(
            "page",
            FetchRequest::get(format!("https://indienova.com/game/{sid}")),
        )
    }

    pub fn parse(sid: &str, page: &str) -> Result<IndienovaData> {
        if page.contains(NOT_FOUND_MARKER) {
            tracing::debug!(sid, "indienova game missing");
            return Err(Error::NotFound);
        }

        let document = Html::parse_document(page);
        let intro = Self::first_text(&document, "#tabs-intro div.bottommargin-sm");
        let descr = Self::first_text(&document, "article")
            .and_then(|descr| non_empty(descr.replace("……显示全部", "")))
            .or_else(|| intro.clone());

        Ok(IndienovaData {
            poster: Self::first_attr(&document, "div.cover-image img", "src"),
            chinese_title: Self::extract_chinese_title(&document),
            english_title: Self::first_text(&document, "div.title-holder h1 span"),
            another_title: Self::first_text(&document, "div.title-holder h1 small"),
            release_date: Self::first_text(&document, "div.title-holder p.gamedb-release"),
            links: Self::extract_links(&document),
            intro,
            intro_detail: Self::extract_intro_detail(&document),
            descr,
            rate: Self::extract_rate(&document),
            dev: Self::extract_company(&document, 0),
            publisher: Self::extract_company(&document, 1),
            screenshot: Self::all_attrs(&document, "li.slide img", "src"),
            cat: Self::extract_tags(&document),
            level: Self::extract_level(&document),
            price: Self::extract_prices(&document),
        })
    }

    fn first_text(document: &Html, css: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next().map(element_text).and_then(non_empty)
    }

    fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .next()?
            .value()
            .attr(attr)
            .and_then(non_empty)
    }

    fn all_attrs(document: &Html, css: &str, attr: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(css) else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .filter_map(non_empty)
            .collect()
    }

    /// 页面标题 `中文名 - 副标题 | indienova GameDB` 的第一段
    fn extract_chinese_title(document: &Html) -> Option<String> {
        let title = Self::first_text(document, "title")?;
        let head = title.split('|').next()?.split('-').next()?;
        non_empty(head)
    }

    /// 商店链接, 同名站点保留首次出现的位置
    fn extract_links(document: &Html) -> Vec<StoreLink> {
        let Ok(selector) = Selector::parse("div#tabs-link a.gamedb-link") else {
            return Vec::new();
        };

        let mut links: Vec<StoreLink> = Vec::new();
        for a in document.select(&selector) {
            let site = element_text(a);
            let url = a.value().attr("href").unwrap_or_default().to_string();
            match links.iter_mut().find(|link| link.site == site) {
                Some(link) => link.url = url,
                None => links.push(StoreLink { site, url }),
            }
        }
        links
    }

    fn extract_intro_detail(document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("#tabs-intro p.single-line") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|p| {
                let text = p.text().collect::<String>();
                non_empty(collapse_whitespace(&text).replace(',', "/"))
            })
            .collect()
    }

    /// 评分图上的四个数值, 不足时视为缺失
    fn extract_rate(document: &Html) -> Option<String> {
        let selector = Selector::parse("div#scores text").ok()?;
        let values = document.select(&selector).map(element_text).collect::<Vec<_>>();

        match values.as_slice() {
            [a, b, c, d, ..] => Some(format!("{a}:{b} / {c}:{d}")),
            _ => None,
        }
    }

    /// 第 `index` 个公司列表, 0 为开发商, 1 为发行商
    fn extract_company(document: &Html, index: usize) -> Vec<String> {
        let Ok(selector) = Selector::parse(r#"div#tabs-devpub ul[class^="db-companies"]"#) else {
            return Vec::new();
        };

        document
            .select(&selector)
            .nth(index)
            .map(|ul| {
                ul.text()
                    .collect::<String>()
                    .split('\n')
                    .filter_map(non_empty)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn extract_tags(document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("div.indienova-tags.gamedb-tags") else {
            return Vec::new();
        };

        let tags = document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();

        dedup_ordered(
            tags.split('\n')
                .filter_map(non_empty)
                .filter(|tag| tag != SHOW_ALL_TAG),
        )
    }

    /// "分级" 标题后紧邻区块中的评级图标
    fn extract_level(document: &Html) -> Vec<String> {
        let Ok(h4_selector) = Selector::parse("h4") else {
            return Vec::new();
        };
        let Ok(img_selector) = Selector::parse("img") else {
            return Vec::new();
        };

        document
            .select(&h4_selector)
            .filter(|h4| h4.text().collect::<String>().contains("分级"))
            .filter_map(|h4| h4.next_siblings().find_map(ElementRef::wrap))
            .filter(|block| {
                block.value().name() == "div"
                    && block.value().classes().any(|class| class == "bottommargin-sm")
            })
            .flat_map(|block| {
                block
                    .select(&img_selector)
                    .filter_map(|img| img.value().attr("src").map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// 各商店价格, 区块内依次为商店, 平台, 价格
    fn extract_prices(document: &Html) -> Vec<String> {
        let Ok(li_selector) = Selector::parse("ul.db-stores li") else {
            return Vec::new();
        };
        let Ok(field_selector) = Selector::parse("a > div") else {
            return Vec::new();
        };

        document
            .select(&li_selector)
            .filter_map(|li| {
                let fields = li.select(&field_selector).collect::<Vec<_>>();
                let store = element_text(*fields.first()?);
                let price = fields.get(2).map(|f| element_text(*f)).unwrap_or_default();
                let price = collapse_whitespace(&price);
                Some(format!("{store}：{price}"))
            })
            .collect()
    }
}

impl Extractor for IndienovaExtractor {
    async fn extract<F: Fetcher>(&self, ctx: &Context<'_, F>, sid: &str) -> Result<MediaData> {
        let payloads = Self::plan(sid).execute(ctx.fetcher).await?;
        Self::parse(sid, payloads.text("page")?).map(MediaData::Indienova)
    }
}

#[test]
fn test_extract() -> Result<()> {
    let page = r#"
        <html>
        <head><title>蔚蓝 - Celeste | indienova GameDB 游戏库</title></head>
        <body>
            <div class="cover-image"><img src="https://static.indienova.com/cover/celeste.jpg"></div>
            <div class="title-holder">
                <h1>蔚蓝 <span>Celeste</span> <small>塞莱斯特</small></h1>
                <p class="gamedb-release">2018-01-25</p>
            </div>
            <div id="tabs-link">
                <a class="gamedb-link" href="https://store.steampowered.com/app/504230/">Steam</a>
                <a class="gamedb-link" href="http://www.celestegame.com/">官网</a>
            </div>
            <div id="tabs-intro">
                <div class="bottommargin-sm">帮助玛德琳登上塞莱斯特山。</div>
                <p class="single-line">类型:
                    平台跳跃, 独立</p>
                <p class="single-line">平台: PC</p>
            </div>
            <article>完整的游戏介绍。……显示全部</article>
            <div id="scores"><svg><text>indienova</text><text>9.2</text><text>玩家</text><text>8.9</text></svg></div>
            <div id="tabs-devpub">
                <ul class="db-companies first">
                    <li>Maddy Makes Games</li>
                </ul>
                <ul class="db-companies">
                    <li>Matt Makes Games</li>
                    <li>Extremely OK Games</li>
                </ul>
            </div>
            <ul><li class="slide"><img src="https://static.indienova.com/ss/1.jpg"></li></ul>
            <div class="indienova-tags gamedb-tags">
                <a>像素</a>
                <a>平台跳跃</a>
                <a>像素</a>
                <a>查看全部 +</a>
            </div>
            <h4>分级</h4>
            <div class="bottommargin-sm"><img src="https://static.indienova.com/rating/esrb-e10.png"></div>
            <ul class="db-stores">
                <li><a href="https://store.steampowered.com/app/504230/"><div>Steam</div><div></div><div>¥ 68.00</div></a></li>
            </ul>
        </body>
        </html>"#;

    let data = IndienovaExtractor::parse("celeste", page)?;

    assert_eq!(data.poster.as_deref(), Some("https://static.indienova.com/cover/celeste.jpg"));
    assert_eq!(data.chinese_title.as_deref(), Some("蔚蓝"));
    assert_eq!(data.english_title.as_deref(), Some("Celeste"));
    assert_eq!(data.another_title.as_deref(), Some("塞莱斯特"));
    assert_eq!(data.release_date.as_deref(), Some("2018-01-25"));
    assert_eq!(data.links.len(), 2);
    assert_eq!(data.links[1].site, "官网");
    assert_eq!(data.intro.as_deref(), Some("帮助玛德琳登上塞莱斯特山。"));
    assert_eq!(data.intro_detail, vec!["类型: 平台跳跃/ 独立", "平台: PC"]);
    assert_eq!(data.descr.as_deref(), Some("完整的游戏介绍。"));
    assert_eq!(data.rate.as_deref(), Some("indienova:9.2 / 玩家:8.9"));
    assert_eq!(data.dev, vec!["Maddy Makes Games"]);
    assert_eq!(data.publisher, vec!["Matt Makes Games", "Extremely OK Games"]);
    assert_eq!(data.screenshot, vec!["https://static.indienova.com/ss/1.jpg"]);
    assert_eq!(data.cat, vec!["像素", "平台跳跃"]);
    assert_eq!(data.level, vec!["https://static.indienova.com/rating/esrb-e10.png"]);
    assert_eq!(data.price, vec!["Steam：¥ 68.00"]);

    Ok(())
}

#[test]
fn test_partial_rate_is_absent() -> Result<()> {
    let page = r#"<html><body><div id="scores"><svg><text>indienova</text><text>9.2</text></svg></div></body></html>"#;
    let data = IndienovaExtractor::parse("x", page)?;

    assert_eq!(data.rate, None);
    assert_eq!(data.descr, None);
    Ok(())
}

#[test]
fn test_not_found() {
    assert!(matches!(
        IndienovaExtractor::parse("missing", "<html><body>出现错误！</body></html>"),
        Err(Error::NotFound)
    ));
}
