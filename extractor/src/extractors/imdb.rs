//! IMDb 提取器

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
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::*;
use crate::fetch::*;
use crate::models::*;
use crate::traits::{Context, Extractor};
use crate::utils::*;

static JSONLD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<script type="application/ld\+json">([\S\s]+?)</script>"#).unwrap()
});

static DETAILS_NOISE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"See more »|Show more on {3}IMDbPro »").unwrap());

static DETAILS_KEY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r": ?").unwrap());

static REVIEW_BAR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.titleReviewBar > div.titleReviewBarItem").unwrap());

static DETAILS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#titleDetails div.txt-block").unwrap());

/// 页面不存在标记
const NOT_FOUND_MARKER: &str = "404 Error - IMDb";

/// IMDb 提取器
#[derive(Extractable)]
#[extractor(site = Imdb, pattern = r"(?:https?://)?(?:www\.)?imdb\.com/title/(tt\d+)/?")]
pub struct ImdbExtractor;

impl ImdbExtractor {
    /// 规范化 id: 去除 `tt` 前缀, 不足 7 位左侧补零
    pub fn normalize_id(sid: &str) -> String {
        let digits = sid.strip_prefix("tt").unwrap_or(sid);
        format!("tt{digits:0>7}")
    }

    pub fn title_link(imdb_id: &str) -> String {
        format!("https://www.imdb.com/title/{imdb_id}/")
    }

    fn plan(imdb_id: &str) -> FetchPlan {
        let link = Self::title_link(imdb_id);
        FetchPlan::new()
            .with("page", FetchRequest::get(&link))
            .with("releaseinfo", FetchRequest::get(format!("{link}releaseinfo")))
    }

    /// 解析标题页与发行信息页
    pub fn parse(imdb_id: &str, page: &str, release_info: &str) -> Result<ImdbData> {
        if page.contains(NOT_FOUND_MARKER) {
            tracing::debug!(imdb_id, "imdb title page missing");
            return Err(Error::NotFound);
        }

        let json = Self::extract_page_json(page)?;
        let mut data = ImdbData {
            imdb_id: imdb_id.to_string(),
            imdb_link: Self::title_link(imdb_id),
            ..Default::default()
        };

        Self::fill_from_json(&mut data, &json);

        let document = Html::parse_document(page);
        Self::fill_review_bar(&mut data, &document);
        data.details = Self::extract_details(&document);

        let release_doc = Html::parse_document(release_info);
        data.release_date = Self::extract_release_dates(&release_doc);
        data.aka = Self::extract_aka(&release_doc);

        Ok(data)
    }

    /// 页面内嵌的 ld+json, 缺失视为内部错误
    fn extract_page_json(page: &str) -> Result<Value> {
        let raw = JSONLD_REGEX
            .captures(page)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| Error::MissingLandmark("application/ld+json".to_string()))?;
        Ok(serde_json::from_str(&raw.as_str().replace('\n', ""))?)
    }

    fn fill_from_json(data: &mut ImdbData, json: &Value) {
        data.kind = json_str(json, "@type");
        data.name = json_str(json, "name");
        data.genre = json.get("genre").map(string_or_list).unwrap_or_default();
        data.content_rating = json_str(json, "contentRating");
        data.date_published = json_str(json, "datePublished");
        data.description = json_str(json, "description");
        data.duration = json_str(json, "duration");
        data.poster = json_str(json, "image");

        data.year = data
            .date_published
            .as_deref()
            .and_then(|date| date.get(..4))
            .map(str::to_string);

        data.actors = Self::extract_people(json, "actor");
        data.directors = Self::extract_people(json, "director");
        data.creators = Self::extract_people(json, "creator");

        data.keywords = json
            .get("keywords")
            .and_then(Value::as_str)
            .map(|raw| raw.split(',').filter_map(non_empty).collect())
            .unwrap_or_default();

        if let Some(rating) = json.get("aggregateRating") {
            let average = match rating.get("ratingValue") {
                Some(Value::String(s)) => s.parse().unwrap_or(0.0),
                Some(v) => v.as_f64().unwrap_or(0.0),
                None => 0.0,
            };
            let votes = rating.get("ratingCount").and_then(Value::as_u64).unwrap_or(0);
            data.imdb_rating = Some(Rating::new(average, votes));
        }
    }

    /// 人员可能是单个对象或列表, 只保留 Person
    fn extract_people(json: &Value, key: &str) -> Vec<Person> {
        let items = match json.get(key) {
            Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
            Some(item @ Value::Object(_)) => vec![item],
            _ => return Vec::new(),
        };

        items
            .into_iter()
            .filter(|item| item.get("@type").and_then(Value::as_str) == Some("Person"))
            .filter_map(|item| {
                Some(Person {
                    name: json_str(item, "name")?,
                    url: json_str(item, "url"),
                })
            })
            .collect()
    }

    /// Metascore, Reviews, Popularity
    fn fill_review_bar(data: &mut ImdbData, document: &Html) {
        let Ok(metascore_selector) = Selector::parse("div.metacriticScore") else {
            return;
        };
        let Ok(reviews_selector) = Selector::parse("a[href^=reviews]") else {
            return;
        };
        let Ok(critic_selector) = Selector::parse("a[href^=externalreviews]") else {
            return;
        };

        for item in document.select(&REVIEW_BAR_SELECTOR) {
            let text = item.text().collect::<String>();
            if text.contains("Metascore") {
                if let Some(score) = item.select(&metascore_selector).next() {
                    data.metascore = non_empty(element_text(score));
                }
            } else if text.contains("Reviews") {
                if let Some(reviews) = item.select(&reviews_selector).next() {
                    data.reviews = Some(number_from_label(&element_text(reviews)));
                }
                if let Some(critic) = item.select(&critic_selector).next() {
                    data.critic = Some(number_from_label(&element_text(critic)));
                }
            } else if text.contains("Popularity") {
                data.popularity = Some(number_from_label(&text));
            }
        }
    }

    /// Details 区块, 同名键后者覆盖前者但保留首次出现的位置
    fn extract_details(document: &Html) -> Vec<(String, String)> {
        let mut details: Vec<(String, String)> = Vec::new();

        for block in document.select(&DETAILS_SELECTOR) {
            let raw = block.text().collect::<String>().replace('\n', " ");
            let raw = DETAILS_NOISE_REGEX.replace_all(&raw, "");
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let key = DETAILS_KEY_REGEX
                .split(raw)
                .next()
                .unwrap_or_default()
                .to_string();
            let value = raw.replacen(&format!("{key}:"), "", 1);
            let value = collapse_whitespace(&value);

            match details.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => details.push((key, value)),
            }
        }

        details
    }

    fn extract_release_dates(document: &Html) -> Vec<ReleaseDate> {
        let Ok(row_selector) = Selector::parse("tr.release-date-item") else {
            return Vec::new();
        };
        let Ok(country_selector) = Selector::parse("td.release-date-item__country-name") else {
            return Vec::new();
        };
        let Ok(date_selector) = Selector::parse("td.release-date-item__date") else {
            return Vec::new();
        };

        document
            .select(&row_selector)
            .filter_map(|row| {
                let country = row.select(&country_selector).next()?;
                let date = row.select(&date_selector).next()?;
                Some(ReleaseDate {
                    country: element_text(country),
                    date: element_text(date),
                })
            })
            .collect()
    }

    fn extract_aka(document: &Html) -> Vec<AkaTitle> {
        let Ok(row_selector) = Selector::parse("tr.aka-item") else {
            return Vec::new();
        };
        let Ok(country_selector) = Selector::parse("td.aka-item__name") else {
            return Vec::new();
        };
        let Ok(title_selector) = Selector::parse("td.aka-item__title") else {
            return Vec::new();
        };

        document
            .select(&row_selector)
            .filter_map(|row| {
                let country = row.select(&country_selector).next()?;
                let title = row.select(&title_selector).next()?;
                Some(AkaTitle {
                    country: element_text(country),
                    title: element_text(title),
                })
            })
            .collect()
    }
}

/// 字符串或字符串列表
fn string_or_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => non_empty(s).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(non_empty)
            .collect(),
        _ => Vec::new(),
    }
}

impl Extractor for ImdbExtractor {
    async fn extract<F: Fetcher>(&self, ctx: &Context<'_, F>, sid: &str) -> Result<MediaData> {
        let imdb_id = Self::normalize_id(sid);
        let payloads = Self::plan(&imdb_id).execute(ctx.fetcher).await?;

        Self::parse(
            &imdb_id,
            payloads.text("page")?,
            payloads.text("releaseinfo")?,
        )
        .map(MediaData::Imdb)
    }
}

#[cfg(test)]
pub(crate) const MATRIX_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <title>The Matrix (1999) - IMDb</title>
    <script type="application/ld+json">{
  "@context": "http://schema.org",
  "@type": "Movie",
  "url": "/title/tt0133093/",
  "name": "The Matrix",
  "image": "https://m.media-amazon.com/images/M/matrix.jpg",
  "genre": ["Action", "Sci-Fi"],
  "contentRating": "R",
  "actor": [
    {"@type": "Person", "url": "/name/nm0000206/", "name": "Keanu Reeves"},
    {"@type": "Person", "url": "/name/nm0000401/", "name": "Laurence Fishburne"}
  ],
  "director": [
    {"@type": "Person", "url": "/name/nm0905154/", "name": "Lana Wachowski"},
    {"@type": "Person", "url": "/name/nm0905152/", "name": "Lilly Wachowski"}
  ],
  "creator": [
    {"@type": "Person", "url": "/name/nm0905152/", "name": "Lilly Wachowski"},
    {"@type": "Organization", "url": "/company/co0002663/"}
  ],
  "description": "A computer hacker learns about the true nature of reality.",
  "datePublished": "1999-03-31",
  "keywords": "artificial reality,simulated reality,kung fu",
  "aggregateRating": {"@type": "AggregateRating", "ratingCount": 1703000, "ratingValue": 8.7},
  "duration": "PT2H16M"
}</script>
</head>
<body>
    <div class="titleReviewBar">
        <div class="titleReviewBarItem">
            <a href="criticreviews"><div class="metacriticScore score_favorable"><span>73</span></div></a>
            <div>Metascore</div>
        </div>
        <div class="titleReviewBarItem titleReviewbarItemBorder">
            <div>Reviews</div>
            <a href="reviews?ref_=tt_ov_rt">3,582 user</a> |
            <a href="externalreviews?ref_=tt_ov_rt">310 critic</a>
        </div>
        <div class="titleReviewBarItem">
            <div>Popularity</div>
            <span class="subText">164 ( 12)</span>
        </div>
    </div>
    <div id="titleDetails">
        <div class="txt-block"><h4 class="inline">Country:</h4> <a href="/search/title?country_of_origin=us">USA</a></div>
        <div class="txt-block"><h4 class="inline">Language:</h4> <a href="/search/title?title_type=feature">English</a></div>
        <div class="txt-block"><h4 class="inline">Budget:</h4>$63,000,000 <span class="attribute">(estimated)</span></div>
    </div>
</body>
</html>
"#;

#[cfg(test)]
pub(crate) const MATRIX_RELEASE_INFO: &str = r#"
<html>
<body>
    <table class="ipl-zebra-list release-dates-table">
        <tr class="release-date-item">
            <td class="release-date-item__country-name"><a href="/calendar/?region=us">USA</a></td>
            <td class="release-date-item__date">31 March 1999</td>
        </tr>
        <tr class="release-date-item">
            <td class="release-date-item__country-name"><a href="/calendar/?region=jp">Japan</a></td>
            <td class="release-date-item__date">11 September 1999</td>
        </tr>
    </table>
    <table>
        <tr class="aka-item">
            <td class="aka-item__name">China</td>
            <td class="aka-item__title">黑客帝国</td>
        </tr>
    </table>
</body>
</html>
"#;

#[test]
fn test_extract() -> Result<()> {
    let data = ImdbExtractor::parse("tt0133093", MATRIX_PAGE, MATRIX_RELEASE_INFO)?;

    assert_eq!(data.imdb_link, "https://www.imdb.com/title/tt0133093/");
    assert_eq!(data.kind.as_deref(), Some("Movie"));
    assert_eq!(data.name.as_deref(), Some("The Matrix"));
    assert_eq!(data.year.as_deref(), Some("1999"));
    assert_eq!(data.genre, vec!["Action", "Sci-Fi"]);
    assert_eq!(data.keywords.len(), 3);
    assert_eq!(data.actors.len(), 2);
    assert_eq!(data.directors[0].name, "Lana Wachowski");
    // Organization 被过滤
    assert_eq!(data.creators.len(), 1);
    assert_eq!(
        data.imdb_rating.as_ref().map(|r| r.text.as_str()),
        Some("8.7/10 from 1,703,000 users")
    );

    assert_eq!(data.metascore.as_deref(), Some("73"));
    assert_eq!(data.reviews.as_deref(), Some("3582"));
    assert_eq!(data.critic.as_deref(), Some("310"));
    assert_eq!(data.popularity.as_deref(), Some("164"));

    assert_eq!(data.details[0], ("Country".to_string(), "USA".to_string()));
    assert_eq!(data.details[2].0, "Budget");
    assert_eq!(data.details[2].1, "$63,000,000 (estimated)");

    assert_eq!(data.release_date.len(), 2);
    assert_eq!(data.release_date[1].country, "Japan");
    assert_eq!(data.aka[0].title, "黑客帝国");

    Ok(())
}

#[test]
fn test_normalize_id() {
    assert_eq!(ImdbExtractor::normalize_id("0133093"), "tt0133093");
    assert_eq!(ImdbExtractor::normalize_id("133093"), "tt0133093");
    assert_eq!(ImdbExtractor::normalize_id("tt10872600"), "tt10872600");
}

#[test]
fn test_single_person_object() {
    let json = serde_json::json!({
        "director": {"@type": "Person", "name": "Someone", "url": "/name/nm1/"}
    });
    let people = ImdbExtractor::extract_people(&json, "director");

    assert_eq!(people.len(), 1);
    assert_eq!(people[0].url.as_deref(), Some("/name/nm1/"));
}

#[test]
fn test_not_found_precedence() {
    let page = format!("<title>404 Error - IMDb</title>{MATRIX_PAGE}");
    assert!(matches!(
        ImdbExtractor::parse("tt0133093", &page, MATRIX_RELEASE_INFO),
        Err(Error::NotFound)
    ));
}

#[test]
fn test_missing_jsonld() {
    let err = ImdbExtractor::parse("tt0133093", "<html></html>", "").unwrap_err();
    assert!(matches!(err, Error::MissingLandmark(_)));
}
