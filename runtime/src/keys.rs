//! 豆瓣 API key 轮换

use ptgen::ApiKeyProvider;
use rand::seq::IndexedRandom;

/// 每次调用均匀随机取一个 key, 没有 key 时返回 `None`
#[derive(Debug, Clone, Default)]
pub struct RandomKeyRing {
    keys: Vec<String>,
}

impl RandomKeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys: keys.into_iter().filter(|k| !k.trim().is_empty()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ApiKeyProvider for RandomKeyRing {
    fn api_key(&self) -> Option<String> {
        self.keys.choose(&mut rand::rng()).cloned()
    }
}
