//! Epic 提取器

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use registry::Extractable;
use serde_json::Value;

use crate::error::*;
use crate::fetch::*;
use crate::models::*;
use crate::traits::{Context, Extractor};
use crate::utils::*;

/// Epic 提取器
#[derive(Extractable)]
#[extractor(
    site = Epic,
    pattern = r"(?:https?://)?www\.epicgames\.com/store/[a-z]{2}-[A-Z]{2}/product/(\S+)/\S?"
)]
pub struct EpicExtractor;

impl EpicExtractor {
    fn plan(sid: &str) -> FetchPlan {
        FetchPlan::new().with(
            "api",
            FetchRequest::get(format!(
                "https://www.epicgames.com/store/zh-CN/api/content/products/{sid}"
            )),
        )
    }

    /// 解析商品接口返回, 404 即不存在
    pub fn parse(sid: &str, response: &Response) -> Result<EpicData> {
        if response.status == 404 {
            tracing::debug!(sid, "epic product missing");
            return Err(Error::NotFound);
        }

        let json = response.json()?;
        let page = json
            .pointer("/pages/0")
            .ok_or_else(|| Error::MissingLandmark("pages[0]".to_string()))?;

        let string_at = |path: &str| {
            page.pointer(path)
                .and_then(Value::as_str)
                .and_then(non_empty)
        };
        let srcs_at = |path: &str| -> Vec<String> {
            page.pointer(path)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(|item| json_str(item, "src")).collect())
                .unwrap_or_default()
        };

        Ok(EpicData {
            name: string_at("/productName"),
            epic_link: string_at("/_urlPattern")
                .map(|pattern| format!("https://www.epicgames.com/store{pattern}")),
            desc: string_at("/data/about/description"),
            poster: string_at("/data/hero/logoImage/src"),
            screenshot: srcs_at("/data/gallery/galleryImages"),
            language: page
                .pointer("/data/requirements/languages")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).filter_map(non_empty).collect())
                .unwrap_or_default(),
            requirements: Self::extract_requirements(page),
            level: srcs_at("/data/requirements/legalTags"),
        })
    }

    /// 按平台分组, 保持接口给出的顺序
    fn extract_requirements(page: &Value) -> Vec<SystemRequirements> {
        let Some(systems) = page
            .pointer("/data/requirements/systems")
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        let mut groups: Vec<SystemRequirements> = Vec::new();
        for system in systems {
            let Some(system_type) = json_str(system, "systemType") else {
                continue;
            };
            let details = system
                .get("details")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let idx = match groups.iter().position(|g| g.system == system_type) {
                Some(idx) => idx,
                None => {
                    groups.push(SystemRequirements {
                        system: system_type,
                        ..Default::default()
                    });
                    groups.len() - 1
                }
            };

            let group = &mut groups[idx];
            for detail in details {
                let title = json_str(detail, "title").unwrap_or_default();
                let value = |key: &str| detail.get(key).and_then(Value::as_str).unwrap_or_default();
                group.minimum.push(format!("{title}: {}", value("minimum")));
                group.recommended.push(format!("{title}: {}", value("recommended")));
            }
        }
        groups
    }
}

impl Extractor for EpicExtractor {
    async fn extract<F: Fetcher>(&self, ctx: &Context<'_, F>, sid: &str) -> Result<MediaData> {
        let payloads = Self::plan(sid).execute(ctx.fetcher).await?;
        Self::parse(sid, payloads.get("api")?).map(MediaData::Epic)
    }
}

#[test]
fn test_extract() -> Result<()> {
    let body = r#"{
        "productName": "Celeste",
        "pages": [{
            "productName": "蔚蓝",
            "_urlPattern": "/zh-CN/product/celeste/home",
            "data": {
                "about": {"description": "帮助玛德琳登上塞莱斯特山。"},
                "hero": {"logoImage": {"src": "https://cdn1.epicgames.com/logo.png"}},
                "gallery": {"galleryImages": [{"src": "https://cdn1.epicgames.com/1.jpg"}, {"src": "https://cdn1.epicgames.com/2.jpg"}]},
                "requirements": {
                    "languages": ["音频：英语", "文本：简体中文、英语"],
                    "systems": [
                        {"systemType": "Windows", "details": [
                            {"title": "操作系统", "minimum": "Windows 7", "recommended": "Windows 10"},
                            {"title": "内存", "minimum": "2 GB", "recommended": "4 GB"}
                        ]},
                        {"systemType": "macOS", "details": [
                            {"title": "操作系统", "minimum": "10.12", "recommended": "10.14"}
                        ]}
                    ],
                    "legalTags": [{"src": "https://cdn1.epicgames.com/esrb.png"}]
                }
            }
        }]
    }"#;

    let data = EpicExtractor::parse("celeste", &Response::ok(body))?;

    assert_eq!(data.name.as_deref(), Some("蔚蓝"));
    assert_eq!(
        data.epic_link.as_deref(),
        Some("https://www.epicgames.com/store/zh-CN/product/celeste/home")
    );
    assert_eq!(data.desc.as_deref(), Some("帮助玛德琳登上塞莱斯特山。"));
    assert_eq!(data.poster.as_deref(), Some("https://cdn1.epicgames.com/logo.png"));
    assert_eq!(data.screenshot.len(), 2);
    assert_eq!(data.language.len(), 2);
    assert_eq!(data.level, vec!["https://cdn1.epicgames.com/esrb.png"]);

    assert_eq!(data.requirements.len(), 2);
    assert_eq!(data.requirements[0].system, "Windows");
    assert_eq!(
        data.requirements[0].minimum,
        vec!["操作系统: Windows 7", "内存: 2 GB"]
    );
    assert_eq!(data.requirements[0].recommended[1], "内存: 4 GB");
    assert_eq!(data.requirements[1].recommended, vec!["操作系统: 10.14"]);

    Ok(())
}

#[test]
fn test_not_found() {
    let response = Response {
        status: 404,
        body: "not json".to_string(),
    };
    assert!(matches!(
        EpicExtractor::parse("missing", &response),
        Err(Error::NotFound)
    ));
}

#[test]
fn test_missing_pages() {
    let err = EpicExtractor::parse("x", &Response::ok(r#"{"pages": []}"#)).unwrap_err();
    assert!(matches!(err, Error::MissingLandmark(_)));
}
