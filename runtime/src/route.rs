//! 请求参数路由

use ptgen::GenConfig;
use ptgen::models::Site;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Miss key of `site` or `sid` , or input unsupported resource `url`.")]
    MissingKey,
    #[error("Unknown value of key `site`.")]
    UnknownSite,
}

/// 从请求中取得站点与 id
///
/// 可传入完整请求链接或查询串. `url=` 优先, 交给站点识别;
/// 否则读取 `site=` 与 `sid=`.
pub fn route(config: &GenConfig, query: &str) -> Result<(Site, String), RouteError> {
    let pairs = query_pairs(query);
    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    };

    if let Some(url) = get("url") {
        tracing::debug!(url, "routing by resource url");
        return config.select_site(url).ok_or(RouteError::MissingKey);
    }

    let (Some(site), Some(sid)) = (get("site"), get("sid")) else {
        return Err(RouteError::MissingKey);
    };
    let site = site.parse::<Site>().map_err(|_| RouteError::UnknownSite)?;
    Ok((site, sid.to_string()))
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    let raw = match Url::parse(query) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => query.trim().trim_start_matches('?').to_string(),
    };
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_by_url() {
        let config = GenConfig::default();

        assert_eq!(
            route(
                &config,
                "https://ptgen.example.com/?url=https%3A%2F%2Fmovie.douban.com%2Fsubject%2F1291843%2F"
            ),
            Ok((Site::Douban, "1291843".to_string()))
        );
        assert_eq!(
            route(&config, "?url=https://bgm.tv/subject/253"),
            Ok((Site::Bangumi, "253".to_string()))
        );
    }

    #[test]
    fn test_route_by_site_and_sid() {
        let config = GenConfig::default();

        assert_eq!(
            route(&config, "site=imdb&sid=tt0133093"),
            Ok((Site::Imdb, "tt0133093".to_string()))
        );
        assert_eq!(
            route(&config, "http://localhost:8080/?site=steam&sid=570"),
            Ok((Site::Steam, "570".to_string()))
        );
    }

    #[test]
    fn test_route_errors() {
        let config = GenConfig::default();

        assert_eq!(route(&config, "site=douban"), Err(RouteError::MissingKey));
        assert_eq!(route(&config, "sid=1"), Err(RouteError::MissingKey));
        assert_eq!(route(&config, ""), Err(RouteError::MissingKey));
        assert_eq!(
            route(&config, "url=https://example.com/item/1"),
            Err(RouteError::MissingKey)
        );
        assert_eq!(
            route(&config, "site=tmdb&sid=1"),
            Err(RouteError::UnknownSite)
        );
    }

    #[test]
    fn test_route_url_takes_priority() {
        let config = GenConfig::default();

        assert_eq!(
            route(&config, "site=steam&sid=1&url=https://www.imdb.com/title/tt0111161/"),
            Ok((Site::Imdb, "tt0111161".to_string()))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RouteError::MissingKey.to_string(),
            "Miss key of `site` or `sid` , or input unsupported resource `url`."
        );
        assert_eq!(
            RouteError::UnknownSite.to_string(),
            "Unknown value of key `site`."
        );
    }
}
