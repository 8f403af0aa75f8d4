//! 提取器实现

pub mod bangumi;
pub mod douban;
pub mod epic;
pub mod imdb;
pub mod indienova;
pub mod steam;

pub use bangumi::BangumiExtractor;
pub use douban::DoubanExtractor;
pub use epic::EpicExtractor;
pub use imdb::ImdbExtractor;
pub use indienova::IndienovaExtractor;
pub use steam::SteamExtractor;

/// 收集注册的提取器
///
/// 顺序即链接识别时的尝试顺序.
pub(crate) fn registry_items() -> Vec<crate::factory::ExtractorRegistryItem> {
	vec![
		douban::__EXTRACTOR_REGISTRY_DOUBANEXTRACTOR(),
		imdb::__EXTRACTOR_REGISTRY_IMDBEXTRACTOR(),
		bangumi::__EXTRACTOR_REGISTRY_BANGUMIEXTRACTOR(),
		steam::__EXTRACTOR_REGISTRY_STEAMEXTRACTOR(),
		indienova::__EXTRACTOR_REGISTRY_INDIENOVAEXTRACTOR(),
		epic::__EXTRACTOR_REGISTRY_EPICEXTRACTOR(),
	]
}
