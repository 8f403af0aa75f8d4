//! 辅助工具: 文本清洗与规范化

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::error::*;

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,]*").unwrap());

static JSONP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^[^(]+\((.+)\)").unwrap());

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static BR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static PARAGRAPH_OPEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>").unwrap());

static PARAGRAPH_CLOSE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p>").unwrap());

static HEADING_CLOSE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</(h[1-6])>").unwrap());

static HEADING_OPEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(h[1-6])(?:\s[^>]*)?>").unwrap());

static BOLD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)(?:b|strong)(?:\s[^>]*)?>").unwrap());

static ITALIC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)(?:i|em)(?:\s[^>]*)?>").unwrap());

static UNDERLINE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(/?)u(?:\s[^>]*)?>").unwrap());

static LIST_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(/?)(?:ul|ol)(?:\s[^>]*)?>").unwrap());

static LIST_ITEM_OPEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<li(?:\s[^>]*)?>").unwrap());

static LIST_ITEM_CLOSE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</li>").unwrap());

static IMG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]*?\ssrc\s*=\s*["']([^"']+)["'][^>]*>"#).unwrap());

static BLANK_LINES_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// 折叠连续空白为单个空格并去除首尾空白
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_REGEX.replace_all(s.trim(), " ").into_owned()
}

/// 为多行文本的后续行添加缩进, 用于块状渲染
pub fn indent_continuation(text: &str, indent: &str) -> String {
    text.replace('\n', &format!("\n{indent}"))
}

/// 取出标签中的第一段数字 (去除千位分隔符), 不存在时为 "0"
pub fn number_from_label(raw: &str) -> String {
    NUMBER_REGEX
        .find(raw)
        .map(|m| m.as_str().replace(',', ""))
        .unwrap_or_else(|| "0".to_string())
}

/// 以千位分隔符格式化整数
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// 去除首尾空白, 空串视为缺失
pub fn non_empty(s: impl AsRef<str>) -> Option<String> {
    let txt = s.as_ref().trim();
    if txt.is_empty() {
        None
    } else {
        Some(txt.to_string())
    }
}

/// 保持首次出现顺序去重
pub fn dedup_ordered<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// 解码固定的一组 HTML 实体
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// 移除所有标签
pub fn strip_tags(html: &str) -> String {
    TAG_REGEX.replace_all(html, "").into_owned()
}

/// 将 HTML 片段转换为 BBCode 文本
pub fn html_to_bbcode(html: &str) -> String {
    let s = WHITESPACE_REGEX.replace_all(html, " ");
    let s = BR_REGEX.replace_all(&s, "\n");
    let s = PARAGRAPH_OPEN_REGEX.replace_all(&s, "");
    let s = PARAGRAPH_CLOSE_REGEX.replace_all(&s, "\n\n");
    let s = HEADING_CLOSE_REGEX.replace_all(&s, "[/${1}]\n");
    let s = HEADING_OPEN_REGEX.replace_all(&s, "[${1}]");
    let s = BOLD_REGEX.replace_all(&s, "[${1}b]");
    let s = ITALIC_REGEX.replace_all(&s, "[${1}i]");
    let s = UNDERLINE_REGEX.replace_all(&s, "[${1}u]");
    let s = LIST_REGEX.replace_all(&s, "[${1}list]\n");
    let s = LIST_ITEM_OPEN_REGEX.replace_all(&s, "[*]");
    let s = LIST_ITEM_CLOSE_REGEX.replace_all(&s, "\n");
    let s = IMG_REGEX.replace_all(&s, "[img]${1}[/img]");
    let s = decode_entities(&strip_tags(&s));

    let lines = s.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_LINES_REGEX
        .replace_all(&lines, "\n\n")
        .trim()
        .to_string()
}

/// 解析 JSONP 返回
pub fn parse_jsonp(raw: &str) -> Result<serde_json::Value> {
    let body = JSONP_REGEX
        .captures(raw.trim())
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::Parse("malformed jsonp payload".to_string()))?;
    Ok(serde_json::from_str(body.as_str())?)
}

/// 元素的完整文本, 去除首尾空白
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// 读取 JSON 字符串字段, 空串视为缺失
pub fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).and_then(non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_number_from_label() {
        assert_eq!(number_from_label("1,234 user reviews"), "1234");
        assert_eq!(number_from_label("Popularity 12 (up 3)"), "12");
        assert_eq!(number_from_label("no digits"), "0");
        // 数字前的逗号不算在内
        assert_eq!(number_from_label("Reviews, 1,234 user"), "1234");
        assert_eq!(number_from_label(", , 7"), "7");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_dedup_ordered() {
        let items = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(dedup_ordered(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_indent_continuation() {
        assert_eq!(indent_continuation("a\nb", "　　"), "a\n　　b");
    }

    #[test]
    fn test_html_to_bbcode() {
        let html = r#"<h2>关于这款游戏</h2>
            <p>Tom &amp; Jerry<br>second line</p>
            <p><strong>Bold</strong> <img src="https://cdn/a.jpg"></p>
            <ul class="bb_ul"><li>one</li><li>two</li></ul>"#;

        assert_eq!(
            html_to_bbcode(html),
            "[h2]关于这款游戏[/h2]\nTom & Jerry\nsecond line\n\n[b]Bold[/b] [img]https://cdn/a.jpg[/img]\n\n[list]\n[*]one\n[*]two\n[/list]"
        );
    }

    #[test]
    fn test_parse_jsonp() {
        let value = parse_jsonp(r#"imdb.rating.run({"resource":{"rating":8.7}})"#).unwrap();
        assert_eq!(value["resource"]["rating"], 8.7);
        assert!(parse_jsonp("not jsonp").is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  x "), Some("x".to_string()));
        assert_eq!(non_empty(" \n"), None);
    }
}
