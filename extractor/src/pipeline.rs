//! 流水线: 识别站点, 调用对应提取器, 生成记录

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::config::GenConfig;
use crate::error::*;
use crate::extractors::*;
use crate::fetch::Fetcher;
use crate::models::*;
use crate::traits::{Context, Extractor};

/// 单次提取的协调者
pub struct Pipeline<'a, F: Fetcher> {
    config: &'a GenConfig,
    fetcher: &'a F,
}

impl<'a, F: Fetcher> Pipeline<'a, F> {
    pub fn new(config: &'a GenConfig, fetcher: &'a F) -> Self {
        Self { config, fetcher }
    }

    pub fn select_site(&self, input: &str) -> Option<(Site, String)> {
        self.config.select_site(input)
    }

    /// 调用站点对应的提取器, 任何错误都转换为失败记录
    pub async fn extract(&self, site: Site, sid: &str) -> Record {
        let ctx = Context {
            fetcher: self.fetcher,
            config: self.config,
        };

        tracing::info!(%site, sid, "extraction started");
        let result = match site {
            Site::Douban => DoubanExtractor.extract(&ctx, sid).await,
            Site::Imdb => ImdbExtractor.extract(&ctx, sid).await,
            Site::Bangumi => BangumiExtractor.extract(&ctx, sid).await,
            Site::Steam => SteamExtractor.extract(&ctx, sid).await,
            Site::Indienova => IndienovaExtractor.extract(&ctx, sid).await,
            Site::Epic => EpicExtractor.extract(&ctx, sid).await,
        };

        match result {
            Ok(data) => {
                tracing::info!(%site, sid, "extraction finished");
                Record::success(site, sid, data)
            }
            Err(e) => {
                tracing::warn!(%site, sid, kind = ?e.kind(), error = %e, "extraction failed");
                Record::failure(site, sid, &e)
            }
        }
    }

    /// 识别链接后提取, 无法识别时返回 `Error::NoExtractor`
    pub async fn generate(&self, input: &str) -> Result<Record> {
        let (site, sid) = self
            .select_site(input)
            .ok_or_else(|| Error::NoExtractor(input.to_string()))?;
        Ok(self.extract(site, &sid).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NONE_EXIST_ERROR;
    use crate::fetch::testing::FixtureFetcher;
    use futures::executor::block_on;

    const IMDB_PAGE: &str = "https://www.imdb.com/title/tt0133093/";
    const IMDB_RELEASE: &str = "https://www.imdb.com/title/tt0133093/releaseinfo";

    fn imdb_fetcher() -> FixtureFetcher {
        FixtureFetcher::new()
            .route(IMDB_PAGE, crate::extractors::imdb::MATRIX_PAGE)
            .route(IMDB_RELEASE, crate::extractors::imdb::MATRIX_RELEASE_INFO)
    }

    #[test]
    fn test_imdb_end_to_end() {
        let config = GenConfig::default();
        let fetcher = imdb_fetcher();
        let record = block_on(Pipeline::new(&config, &fetcher).extract(Site::Imdb, "0133093"));

        assert!(record.is_success());
        assert_eq!(record.sid, "0133093");
        let Some(MediaData::Imdb(data)) = record.data() else {
            panic!("unexpected record: {record:?}");
        };
        assert_eq!(data.imdb_id, "tt0133093");
        assert_eq!(data.year.as_deref(), Some("1999"));
        assert!(
            record
                .format()
                .starts_with("[img]https://m.media-amazon.com/images/M/matrix.jpg[/img]\n\nTitle: The Matrix\n")
        );
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[test]
    fn test_deterministic() {
        let config = GenConfig::default();
        let fetcher = imdb_fetcher();
        let pipeline = Pipeline::new(&config, &fetcher);

        let first = block_on(pipeline.extract(Site::Imdb, "tt0133093"));
        let second = block_on(pipeline.extract(Site::Imdb, "tt0133093"));

        assert_eq!(first, second);
        assert_eq!(first.format(), second.format());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_steam_store_home_not_found() {
        let config = GenConfig::default();
        let fetcher = FixtureFetcher::new()
            .route(
                "https://store.steampowered.com/app/12345/?l=schinese",
                crate::extractors::steam::STORE_HOME_PAGE,
            )
            .route("https://steamdb.steamcn.com/app/12345/data.js?v=38", "proc({})");
        let record = block_on(Pipeline::new(&config, &fetcher).extract(Site::Steam, "12345"));

        assert!(!record.is_success());
        assert_eq!(record.error(), Some(NONE_EXIST_ERROR));
        assert_eq!(record.failure_info().map(|f| f.kind), Some(FailureKind::NotFound));
        assert_eq!(record.format(), "");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value.as_object().map(|o| o.len()), Some(5));

        // 年龄检查 Cookie 随商店页请求发出
        let requests = fetcher.requests();
        let page = requests
            .iter()
            .find(|r| r.url.contains("store.steampowered.com"))
            .unwrap();
        assert!(page.headers.iter().any(|(name, _)| name == "Cookie"));
    }

    #[test]
    fn test_douban_cross_reference() {
        use crate::extractors::douban::*;

        let config = GenConfig::default();
        let fetcher = FixtureFetcher::new()
            .route(
                "https://api.douban.com/v2/movie/imdb/tt0133093",
                r#"{"alt": "https://movie.douban.com/movie/1291843", "title": "The Matrix"}"#,
            )
            .route("https://movie.douban.com/subject/1291843/", MATRIX_PAGE)
            .route("https://api.douban.com/v2/movie/1291843", MATRIX_API)
            .route("https://movie.douban.com/subject/1291843/awards", MATRIX_AWARDS)
            .route(
                "https://p.media-imdb.com/static-content/documents/v1/title/tt0133093/ratings%3Fjsonp=imdb.rating.run:imdb.api.title.ratings/data.json",
                MATRIX_IMDB_RATING,
            );
        let record = block_on(Pipeline::new(&config, &fetcher).extract(Site::Douban, "tt0133093"));

        assert!(record.is_success(), "{:?}", record.failure_info());
        assert_eq!(record.sid, "tt0133093");
        let Some(MediaData::Douban(data)) = record.data() else {
            panic!("unexpected record: {record:?}");
        };
        assert_eq!(data.douban_link, "https://movie.douban.com/subject/1291843/");
        assert_eq!(
            data.imdb_rating.as_ref().map(|r| r.text.as_str()),
            Some("8.7/10 from 1,703,000 users")
        );

        let requested = fetcher.requested();
        assert_eq!(requested[0], "https://api.douban.com/v2/movie/imdb/tt0133093");
        assert!(
            requested[1..]
                .iter()
                .all(|url| !url.contains("subject/tt") && !url.ends_with("movie/tt0133093"))
        );
        assert!(record.format().contains("◎IMDb评分  8.7/10 from 1,703,000 users"));
    }

    #[test]
    fn test_douban_unresolved_cross_reference() {
        let config = GenConfig::default();
        let fetcher = FixtureFetcher::new().route(
            "https://api.douban.com/v2/movie/imdb/tt9999999",
            r#"{"code": 5000}"#,
        );
        let record = block_on(Pipeline::new(&config, &fetcher).extract(Site::Douban, "tt9999999"));
        let failure = record.failure_info().unwrap();

        assert_eq!(failure.kind, FailureKind::UnresolvedCrossReference);
        assert_eq!(failure.message, "Can't find this imdb_id(tt9999999) in Douban.");
        assert_eq!(fetcher.requested().len(), 1);
    }

    #[test]
    fn test_douban_api_key() {
        let config = GenConfig::default().with_douban_keys(|| Some("k1".to_string()));
        let fetcher = FixtureFetcher::new().route(
            "https://api.douban.com/v2/movie/imdb/tt1?apikey=k1",
            r#"{}"#,
        );
        let record = block_on(Pipeline::new(&config, &fetcher).extract(Site::Douban, "tt1"));

        assert_eq!(
            record.failure_info().map(|f| f.kind),
            Some(FailureKind::UnresolvedCrossReference)
        );
    }

    #[test]
    fn test_fetch_failure_is_internal_error() {
        let config = GenConfig::default();
        let fetcher = FixtureFetcher::new();
        let record = block_on(Pipeline::new(&config, &fetcher).extract(Site::Bangumi, "253"));
        let failure = record.failure_info().unwrap();

        assert_eq!(failure.kind, FailureKind::InternalError);
        assert!(failure.message.starts_with("Internal Error. Exception: fetch error"));
    }

    #[test]
    fn test_generate() {
        let config = GenConfig::default();
        let fetcher = imdb_fetcher();
        let pipeline = Pipeline::new(&config, &fetcher);

        let record = block_on(pipeline.generate("https://www.imdb.com/title/tt0133093/")).unwrap();
        assert_eq!(record.site, Site::Imdb);
        assert!(record.is_success());

        assert!(matches!(
            block_on(pipeline.generate("https://example.com/")),
            Err(Error::NoExtractor(_))
        ));
    }
}
