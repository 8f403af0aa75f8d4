//! 请求能力与请求计划

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use futures::future::try_join_all;

use crate::error::*;

/// 单个 GET 请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// 响应. 非 2xx 状态同样作为响应返回, 不视为错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// 网络请求能力, 由调用方提供
///
/// 只需实现 [`Fetcher::fetch`]; 传输失败 (连接, 超时等) 返回 `Err`.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Response>;

    async fn fetch_text(&self, request: &FetchRequest) -> Result<String> {
        Ok(self.fetch(request).await?.body)
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        self.fetch(&FetchRequest::get(url)).await?.json()
    }

    async fn fetch_status(&self, url: &str) -> Result<u16> {
        Ok(self.fetch(&FetchRequest::get(url)).await?.status)
    }
}

/// 请求计划. 计划内各请求互不依赖, 并发执行
#[derive(Debug, Default, Clone)]
pub struct FetchPlan {
    entries: Vec<(&'static str, FetchRequest)>,
}

impl FetchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, request: FetchRequest) -> Self {
        self.entries.push((key, request));
        self
    }

    pub fn requests(&self) -> impl Iterator<Item = &FetchRequest> {
        self.entries.iter().map(|(_, req)| req)
    }

    /// 并发执行全部请求, 任一失败则整体失败
    pub async fn execute<F: Fetcher>(&self, fetcher: &F) -> Result<Payloads> {
        tracing::debug!(
            requests = self.entries.len(),
            urls = ?self.requests().map(|r| r.url.as_str()).collect::<Vec<_>>(),
            "executing fetch plan"
        );

        let responses = try_join_all(self.entries.iter().map(|(_, req)| fetcher.fetch(req))).await?;

        Ok(Payloads {
            entries: self
                .entries
                .iter()
                .map(|(key, _)| *key)
                .zip(responses)
                .collect(),
        })
    }
}

/// 计划执行结果, 按键取用
#[derive(Debug, Default)]
pub struct Payloads {
    entries: HashMap<&'static str, Response>,
}

impl Payloads {
    pub fn get(&self, key: &str) -> Result<&Response> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::Parse(format!("no payload for `{key}`")))
    }

    pub fn text(&self, key: &str) -> Result<&str> {
        Ok(self.get(key)?.text())
    }

    pub fn json(&self, key: &str) -> Result<serde_json::Value> {
        self.get(key)?.json()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! 测试用的固定响应请求器

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct FixtureFetcher {
        routes: HashMap<String, Response>,
        log: Mutex<Vec<FetchRequest>>,
    }

    impl FixtureFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn route(self, url: &str, body: &str) -> Self {
            self.route_status(url, 200, body)
        }

        pub(crate) fn route_status(mut self, url: &str, status: u16, body: &str) -> Self {
            self.routes.insert(
                url.to_string(),
                Response {
                    status,
                    body: body.to_string(),
                },
            );
            self
        }

        /// 已请求过的 url, 按请求顺序
        pub(crate) fn requested(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.url).collect()
        }

        pub(crate) fn requests(&self) -> Vec<FetchRequest> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Fetcher for FixtureFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<Response> {
            self.log.lock().unwrap().push(request.clone());
            self.routes
                .get(&request.url)
                .cloned()
                .ok_or_else(|| Error::Fetch(format!("no fixture for {}", request.url)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FixtureFetcher;
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_plan_execute() -> Result<()> {
        let fetcher = FixtureFetcher::new()
            .route("https://a.test/", "page")
            .route("https://b.test/api", r#"{"ok":true}"#);

        let plan = FetchPlan::new()
            .with("page", FetchRequest::get("https://a.test/"))
            .with("api", FetchRequest::get("https://b.test/api"));
        let payloads = block_on(plan.execute(&fetcher))?;

        assert_eq!(payloads.text("page")?, "page");
        assert_eq!(payloads.json("api")?["ok"], true);
        assert!(payloads.get("missing").is_err());
        Ok(())
    }

    #[test]
    fn test_plan_all_or_nothing() {
        let fetcher = FixtureFetcher::new().route("https://a.test/", "page");
        let plan = FetchPlan::new()
            .with("page", FetchRequest::get("https://a.test/"))
            .with("gone", FetchRequest::get("https://gone.test/"));

        assert!(matches!(block_on(plan.execute(&fetcher)), Err(Error::Fetch(_))));
    }

    #[test]
    fn test_provided_capabilities() -> Result<()> {
        let fetcher = FixtureFetcher::new().route_status("https://a.test/", 404, "{}");

        assert_eq!(block_on(fetcher.fetch_status("https://a.test/"))?, 404);
        assert_eq!(block_on(fetcher.fetch_json("https://a.test/"))?, serde_json::json!({}));
        Ok(())
    }
}
