//! 豆瓣提取器

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use feruca::Collator;
use once_cell::sync::Lazy;
use regex::Regex;
use registry::Extractable;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::constants::DOUBAN_BANNED_ERROR;
use crate::error::*;
use crate::fetch::*;
use crate::models::*;
use crate::traits::{Context, Extractor, Registered};
use crate::utils::*;

// 豆瓣条目链接, 用于从 IMDb 反查结果中取出豆瓣 id
static SUBJECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(<DoubanExtractor as Registered>::PATTERN).unwrap());

static IMDB_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").unwrap());

static POSTER_SIZE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"s(_ratio_poster|pic)").unwrap());

static RELEASE_DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:-(\d{1,2}))?(?:-(\d{1,2}))?").unwrap());

static AWARDS_SPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \n]").unwrap());

static AWARDS_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(div|ul)[^>]*>").unwrap());

static AWARDS_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static AWARDS_TRAILING_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r" +\n").unwrap());

static INFO_LABEL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#info span.pl").unwrap());

/// 请求过于频繁
const BANNED_MARKER: &str = "检测到有异常请求";

/// 条目不存在 (隐藏条目同样显示该标记)
const NOT_FOUND_MARKER: &str = "页面不存在";

const NO_SUMMARY: &str = "暂无相关剧情介绍";

/// 豆瓣提取器
#[derive(Extractable)]
#[extractor(
    site = Douban,
    pattern = r"(?:https?://)?(?:(?:movie|www)\.)?douban\.com/(?:subject|movie)/(\d+)/?"
)]
pub struct DoubanExtractor;

impl DoubanExtractor {
    fn api_url(path: &str, api_key: Option<&str>) -> String {
        match api_key {
            Some(key) => format!("https://api.douban.com/v2/movie/{path}?apikey={key}"),
            None => format!("https://api.douban.com/v2/movie/{path}"),
        }
    }

    pub fn subject_link(sid: &str) -> String {
        format!("https://movie.douban.com/subject/{sid}/")
    }

    fn imdb_rating_url(imdb_id: &str) -> String {
        format!(
            "https://p.media-imdb.com/static-content/documents/v1/title/{imdb_id}/ratings%3Fjsonp=imdb.rating.run:imdb.api.title.ratings/data.json"
        )
    }

    fn plan(sid: &str, api_key: Option<&str>) -> FetchPlan {
        let link = Self::subject_link(sid);
        FetchPlan::new()
            .with("page", FetchRequest::get(&link))
            .with("api", FetchRequest::get(Self::api_url(sid, api_key)))
            .with("awards", FetchRequest::get(format!("{link}awards")))
    }

    /// IMDb id 转换为豆瓣 id, 非 `tt` 开头的 id 原样返回
    async fn resolve_sid<F: Fetcher>(
        ctx: &Context<'_, F>,
        sid: &str,
        api_key: Option<&str>,
    ) -> Result<String> {
        if !sid.starts_with("tt") {
            return Ok(sid.to_string());
        }

        let url = Self::api_url(&format!("imdb/{sid}"), api_key);
        let json = ctx.fetcher.fetch_json(&url).await?;
        let resolved = Self::sid_from_lookup(&json)
            .ok_or_else(|| Error::UnresolvedCrossReference(sid.to_string()))?;

        tracing::debug!(imdb_id = sid, douban_id = %resolved, "resolved imdb id on douban");
        Ok(resolved)
    }

    /// 反查结果的 `alt` 链接中的豆瓣 id
    fn sid_from_lookup(json: &Value) -> Option<String> {
        let alt = json.get("alt")?.as_str()?;
        let sid = SUBJECT_REGEX.captures(alt)?.get(1)?.as_str();
        (!sid.starts_with("tt")).then(|| sid.to_string())
    }

    /// 异常请求检查, 先于存在性检查
    fn check_blocked(page: &str, api: &Value) -> Result<()> {
        if let Some(msg) = api.get("msg").and_then(Value::as_str) {
            return Err(Error::Blocked(msg.to_string()));
        }
        if page.contains(BANNED_MARKER) {
            return Err(Error::Blocked(DOUBAN_BANNED_ERROR.to_string()));
        }
        Ok(())
    }

    /// 解析条目页, API 与获奖页
    pub fn parse(sid: &str, page: &str, api: &Value, awards_page: &str) -> Result<DoubanData> {
        Self::check_blocked(page, api)?;

        let document = Html::parse_document(page);
        let title = Self::extract_title(&document);
        if title.contains(NOT_FOUND_MARKER) {
            tracing::debug!(sid, "douban subject missing");
            return Err(Error::NotFound);
        }

        let mut data = DoubanData {
            douban_link: Self::subject_link(sid),
            ..Default::default()
        };

        Self::fill_titles(&mut data, &document, title);
        Self::fill_info(&mut data, &document);
        Self::fill_from_api(&mut data, api);
        data.awards = Self::extract_awards(awards_page);

        Ok(data)
    }

    fn extract_title(document: &Html) -> String {
        let Ok(title_selector) = Selector::parse("title") else {
            return String::new();
        };

        document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>().replace("(豆瓣)", ""))
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    /// `#info` 中标签后紧跟的文本
    fn info_anchor(document: &Html, label: &str) -> Option<String> {
        document
            .select(&INFO_LABEL_SELECTOR)
            .find(|el| el.text().collect::<String>().contains(label))
            .and_then(|el| el.next_sibling())
            .and_then(|node| node.value().as_text().map(|text| text.trim().to_string()))
            .and_then(non_empty)
    }

    fn split_slash(raw: &str) -> Vec<String> {
        raw.split(" / ").filter_map(non_empty).collect()
    }

    fn fill_titles(data: &mut DoubanData, document: &Html, chinese_title: String) {
        if let Ok(selector) = Selector::parse(r#"span[property="v:itemreviewed"]"#)
            && let Some(el) = document.select(&selector).next()
        {
            data.foreign_title = non_empty(el.text().collect::<String>().replace(&chinese_title, ""));
        }

        if let Some(raw) = Self::info_anchor(document, "又名") {
            data.aka = Self::sort_aka(Self::split_slash(&raw));
        }

        match &data.foreign_title {
            Some(foreign) => {
                data.trans_title = std::iter::once(chinese_title.clone())
                    .chain(data.aka.iter().cloned())
                    .collect();
                data.this_title = foreign.split('/').filter_map(non_empty).collect();
            }
            None => {
                data.trans_title = data.aka.clone();
                data.this_title = chinese_title.split('/').filter_map(non_empty).collect();
            }
        }

        data.chinese_title = chinese_title;
    }

    /// 按 Unicode 排序规则 (CLDR 根区域) 排序
    pub fn sort_aka(mut aka: Vec<String>) -> Vec<String> {
        let mut collator = Collator::default();
        aka.sort_by(|a, b| collator.collate(a.as_str(), b.as_str()));
        aka
    }

    /// 按开头的 `YYYY[-MM[-DD]]` 升序, 无日期的排在最后
    pub fn sort_playdate(mut dates: Vec<String>) -> Vec<String> {
        let key = |date: &String| {
            RELEASE_DATE_REGEX.captures(date).map(|caps| {
                let part = |i: usize| {
                    caps.get(i)
                        .and_then(|m| m.as_str().parse::<u32>().ok())
                        .unwrap_or(0)
                };
                (part(1), part(2), part(3))
            })
        };
        dates.sort_by_key(|date| {
            let key = key(date);
            (key.is_none(), key)
        });
        dates
    }

    fn fill_info(data: &mut DoubanData, document: &Html) {
        if let Ok(selector) = Selector::parse("#content > h1 > span.year")
            && let Some(el) = document.select(&selector).next()
        {
            let year = el.text().collect::<String>();
            data.year = non_empty(year.trim().chars().skip(1).take(4).collect::<String>());
        }

        if let Some(raw) = Self::info_anchor(document, "制片国家/地区") {
            data.region = Self::split_slash(&raw);
        }
        if let Some(raw) = Self::info_anchor(document, "语言") {
            data.language = Self::split_slash(&raw);
        }

        if let Ok(selector) = Selector::parse(r#"#info span[property="v:genre"]"#) {
            data.genre = document
                .select(&selector)
                .map(element_text)
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(selector) = Selector::parse(r#"#info span[property="v:initialReleaseDate"]"#) {
            data.playdate = Self::sort_playdate(
                document
                    .select(&selector)
                    .map(element_text)
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        data.episodes = Self::info_anchor(document, "集数");
        data.duration = Self::info_anchor(document, "单集片长").or_else(|| {
            let selector = Selector::parse(r#"#info span[property="v:runtime"]"#).ok()?;
            document.select(&selector).next().map(element_text).and_then(non_empty)
        });

        let imdb_link = Selector::parse("div#info a[href*='://www.imdb.com/title/tt']")
            .ok()
            .and_then(|selector| {
                document
                    .select(&selector)
                    .next()
                    .and_then(|el| el.value().attr("href"))
                    .map(str::to_string)
            })
            // 新版页面只以纯文本给出 IMDb id
            .or_else(|| {
                let raw = Self::info_anchor(document, "IMDb")?;
                let id = IMDB_ID_REGEX.find(&raw)?;
                Some(format!("https://www.imdb.com/title/{}/", id.as_str()))
            });

        if let Some(link) = imdb_link {
            let mut link = link.replacen("http://", "https://", 1);
            if !link.ends_with('/') {
                link.push('/');
            }
            data.imdb_id = IMDB_ID_REGEX.find(&link).map(|m| m.as_str().to_string());
            data.imdb_link = Some(link);
        }
    }

    fn fill_from_api(data: &mut DoubanData, api: &Value) {
        if let Some(rating) = api.get("rating") {
            let average = match rating.get("average") {
                Some(Value::String(s)) => s.parse().unwrap_or(0.0),
                Some(v) => v.as_f64().unwrap_or(0.0),
                None => 0.0,
            };
            let votes = rating.get("numRaters").and_then(Value::as_u64).unwrap_or(0);
            data.douban_rating = Some(Rating::new(average, votes));
        }

        data.introduction = json_str(api, "summary").map(|summary| {
            if summary == "None" {
                NO_SUMMARY.to_string()
            } else {
                summary
            }
        });

        data.poster = json_str(api, "image").map(|image| {
            POSTER_SIZE_REGEX
                .replace_all(&image, "l")
                .replacen("img3", "img1", 1)
        });

        let attrs = api.get("attrs");
        let attr_list = |key: &str| -> Vec<String> {
            attrs
                .and_then(|attrs| attrs.get(key))
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).filter_map(non_empty).collect())
                .unwrap_or_default()
        };
        data.director = attr_list("director");
        data.writer = attr_list("writer");
        data.cast = attr_list("cast");

        data.tags = api
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(|tag| json_str(tag, "name")).collect())
            .unwrap_or_default();
    }

    /// 获奖页正文转为多行文本
    fn extract_awards(awards_page: &str) -> Option<String> {
        let document = Html::parse_document(awards_page);
        let selector = Selector::parse("#content > div > div.article").ok()?;
        let html = document.select(&selector).next()?.inner_html();

        let s = AWARDS_SPACE_REGEX.replace_all(&html, "");
        let s = s.replace("</li><li>", "</li> <li>").replace("</a><span", "</a> <span");
        let s = AWARDS_BLOCK_REGEX.replace_all(&s, "\n");
        let s = AWARDS_TAG_REGEX.replace_all(&s, "");
        let s = s.replace("&nbsp;", " ");
        let s = AWARDS_TRAILING_REGEX.replace_all(&s, "\n");
        non_empty(s)
    }

    /// 豆瓣条目中 IMDb 评分的 JSONP 返回
    pub fn parse_imdb_rating(raw: &str) -> Result<Option<Rating>> {
        let json = parse_jsonp(raw)?;
        let resource = &json["resource"];
        let average = resource.get("rating").and_then(Value::as_f64);
        let votes = resource.get("ratingCount").and_then(Value::as_u64);

        Ok(match (average, votes) {
            (Some(average), Some(votes)) if average > 0.0 && votes > 0 => {
                Some(Rating::new(average, votes))
            }
            _ => None,
        })
    }
}

impl Extractor for DoubanExtractor {
    async fn extract<F: Fetcher>(&self, ctx: &Context<'_, F>, sid: &str) -> Result<MediaData> {
        let api_key = ctx.config.douban_api_key();
        let sid = Self::resolve_sid(ctx, sid, api_key.as_deref()).await?;

        let payloads = Self::plan(&sid, api_key.as_deref())
            .execute(ctx.fetcher)
            .await?;
        let api = payloads.json("api")?;
        let mut data = Self::parse(
            &sid,
            payloads.text("page")?,
            &api,
            payloads.text("awards")?,
        )?;

        if let Some(imdb_id) = &data.imdb_id {
            tracing::debug!(imdb_id, "fetching imdb rating for douban subject");
            let raw = ctx
                .fetcher
                .fetch_text(&FetchRequest::get(Self::imdb_rating_url(imdb_id)))
                .await?;
            data.imdb_rating = Self::parse_imdb_rating(&raw)?;
        }

        Ok(MediaData::Douban(data))
    }
}

#[cfg(test)]
pub(crate) const MATRIX_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head><title>黑客帝国 (豆瓣)</title></head>
<body>
<div id="content">
    <h1>
        <span property="v:itemreviewed">黑客帝国 The Matrix</span>
        <span class="year">(1999)</span>
    </h1>
    <div id="info">
        <span><span class="pl">导演</span>: <span class="attrs"><a href="/celebrity/1013899/">莉莉·沃卓斯基</a></span></span><br/>
        <span class="pl">类型:</span> <span property="v:genre">动作</span> / <span property="v:genre">科幻</span><br/>
        <span class="pl">制片国家/地区:</span> 美国 / 澳大利亚<br/>
        <span class="pl">语言:</span> 英语<br/>
        <span class="pl">上映日期:</span> <span property="v:initialReleaseDate" content="2003-06-06(中国大陆)">2003-06-06(中国大陆)</span> / <span property="v:initialReleaseDate" content="1999-03-31(美国)">1999-03-31(美国)</span><br/>
        <span class="pl">片长:</span> <span property="v:runtime" content="136">136分钟</span><br/>
        <span class="pl">又名:</span> Bravo / Alpha<br/>
        <span class="pl">IMDb链接:</span> <a href="http://www.imdb.com/title/tt0133093" target="_blank" rel="nofollow">tt0133093</a><br/>
    </div>
</div>
</body>
</html>
"#;

#[cfg(test)]
pub(crate) const MATRIX_API: &str = r#"{
    "rating": {"max": 10, "average": "9.0", "numRaters": 512345, "min": 0},
    "summary": "程序员尼奥发现世界是虚拟的。\n他选择了红色药丸。",
    "image": "https://img3.doubanio.com/view/photo/s_ratio_poster/public/p451926968.jpg",
    "attrs": {
        "director": ["莉莉·沃卓斯基 Lilly Wachowski", "拉娜·沃卓斯基 Lana Wachowski"],
        "writer": ["莉莉·沃卓斯基 Lilly Wachowski"],
        "cast": ["基努·里维斯 Keanu Reeves", "劳伦斯·菲什伯恩 Laurence Fishburne"]
    },
    "tags": [{"count": 1, "name": "科幻"}, {"count": 1, "name": "经典"}],
    "alt": "https://movie.douban.com/movie/1291843"
}"#;

#[cfg(test)]
pub(crate) const MATRIX_AWARDS: &str = r#"
<html>
<body>
<div id="content">
    <div class="grid-16-8 clearfix">
        <div class="article">
            <div class="awards">
                <div class="hd"><h2><a href="https://movie.douban.com/awards/Oscar/72/">第72届奥斯卡金像奖</a><span class="year">(2000)</span></h2></div>
                <ul class="award"><li>最佳剪辑</li><li>扎克·斯塔恩伯格</li></ul>
            </div>
        </div>
    </div>
</div>
</body>
</html>
"#;

#[cfg(test)]
pub(crate) const MATRIX_IMDB_RATING: &str = r#"imdb.rating.run({"resource":{"@type":"imdb.api.title.ratings","id":"/title/tt0133093/","rating":8.7,"ratingCount":1703000}})"#;

#[test]
fn test_extract() -> Result<()> {
    let api: Value = serde_json::from_str(MATRIX_API)?;
    let data = DoubanExtractor::parse("1291843", MATRIX_PAGE, &api, MATRIX_AWARDS)?;

    assert_eq!(data.chinese_title, "黑客帝国");
    assert_eq!(data.foreign_title.as_deref(), Some("The Matrix"));
    assert_eq!(data.aka, vec!["Alpha", "Bravo"]);
    assert_eq!(data.trans_title, vec!["黑客帝国", "Alpha", "Bravo"]);
    assert_eq!(data.this_title, vec!["The Matrix"]);
    assert_eq!(data.year.as_deref(), Some("1999"));
    assert_eq!(data.region, vec!["美国", "澳大利亚"]);
    assert_eq!(data.language, vec!["英语"]);
    assert_eq!(data.genre, vec!["动作", "科幻"]);
    assert_eq!(data.playdate, vec!["1999-03-31(美国)", "2003-06-06(中国大陆)"]);
    assert_eq!(data.duration.as_deref(), Some("136分钟"));
    assert_eq!(data.episodes, None);
    assert_eq!(data.imdb_id.as_deref(), Some("tt0133093"));
    assert_eq!(data.imdb_link.as_deref(), Some("https://www.imdb.com/title/tt0133093/"));
    assert_eq!(data.douban_link, "https://movie.douban.com/subject/1291843/");
    assert_eq!(
        data.douban_rating.as_ref().map(|r| r.text.as_str()),
        Some("9/10 from 512,345 users")
    );
    assert_eq!(
        data.poster.as_deref(),
        Some("https://img1.doubanio.com/view/photo/l/public/p451926968.jpg")
    );
    assert_eq!(data.director.len(), 2);
    assert_eq!(data.cast[1], "劳伦斯·菲什伯恩 Laurence Fishburne");
    assert_eq!(data.tags, vec!["科幻", "经典"]);

    let awards = data.awards.unwrap_or_default();
    assert!(awards.starts_with("第72届奥斯卡金像奖 (2000)"));
    assert!(awards.contains("最佳剪辑 扎克·斯塔恩伯格"));

    Ok(())
}

#[test]
fn test_blocked_precedence() -> Result<()> {
    let api: Value = serde_json::from_str(r#"{"msg": "rate_limit_exceeded2", "code": 112}"#)?;
    let err = DoubanExtractor::parse("1291843", MATRIX_PAGE, &api, "").unwrap_err();
    assert!(matches!(err, Error::Blocked(ref msg) if msg == "rate_limit_exceeded2"));

    let api: Value = serde_json::from_str(MATRIX_API)?;
    let page = "<html><body>检测到有异常请求从你的 IP 发出</body></html>";
    let err = DoubanExtractor::parse("1291843", page, &api, "").unwrap_err();
    assert_eq!(err.to_string(), DOUBAN_BANNED_ERROR);

    Ok(())
}

#[test]
fn test_not_found() -> Result<()> {
    let api: Value = serde_json::from_str(MATRIX_API)?;
    let page = "<html><head><title>页面不存在</title></head><body></body></html>";
    assert!(matches!(
        DoubanExtractor::parse("1", page, &api, MATRIX_AWARDS),
        Err(Error::NotFound)
    ));
    Ok(())
}

#[test]
fn test_sort_playdate() {
    let dates = ["2003-06", "unknown", "1999-03-31(美国)", "1999-03-01", "1999"]
        .map(String::from)
        .to_vec();
    assert_eq!(
        DoubanExtractor::sort_playdate(dates),
        vec!["1999", "1999-03-01", "1999-03-31(美国)", "2003-06", "unknown"]
    );
}

#[test]
fn test_sort_aka() {
    let aka = ["bravo", "Alpha", "alpha", "Charlie"].map(String::from).to_vec();
    assert_eq!(
        DoubanExtractor::sort_aka(aka),
        vec!["alpha", "Alpha", "bravo", "Charlie"]
    );

    // 带重音的标题按基本字母排序
    let aka = ["Zorro", "Élan", "alpha", "Alpha"].map(String::from).to_vec();
    assert_eq!(
        DoubanExtractor::sort_aka(aka),
        vec!["alpha", "Alpha", "Élan", "Zorro"]
    );
}

#[test]
fn test_imdb_rating() -> Result<()> {
    let rating = DoubanExtractor::parse_imdb_rating(MATRIX_IMDB_RATING)?;
    assert_eq!(
        rating.map(|r| r.text),
        Some("8.7/10 from 1,703,000 users".to_string())
    );
    Ok(())
}

#[test]
fn test_lookup_alt() {
    let json = serde_json::json!({"alt": "https://movie.douban.com/movie/1291843"});
    assert_eq!(
        DoubanExtractor::sid_from_lookup(&json),
        Some("1291843".to_string())
    );
    assert_eq!(DoubanExtractor::sid_from_lookup(&serde_json::json!({})), None);
}
