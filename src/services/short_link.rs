//! Short recipe links
//!
//! Allocates a random code per recipe and resolves codes back to the
//! recipe URL. Uniqueness rests on the `short_links` unique indexes: a
//! conflicting insert is either a concurrent request for the same recipe
//! (its row wins) or a code collision (draw again).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info, trace, warn};

use crate::config::LinksConfig;
use crate::errors::{FoodgramError, Result};
use crate::storage::SeaOrmStorage;
use crate::storage::backend::is_unique_violation;
use crate::utils::generate_random_code;

use migration::entities::short_link;

/// 短码列宽
const MAX_CODE_LENGTH: usize = 32;

/// 候选短码来源
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 从字符集中均匀随机抽取
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
    alphabet: Vec<char>,
}

impl RandomCodeGenerator {
    pub fn new(length: usize, alphabet: &str) -> Self {
        Self {
            length,
            alphabet: alphabet.chars().collect(),
        }
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        generate_random_code(self.length, &self.alphabet)
    }
}

/// 已分配的短链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLinkView {
    pub recipe_id: i32,
    pub code: String,
    pub original_url: String,
    /// `{base}/s/{code}`
    pub short_url: String,
}

pub struct ShortLinkService {
    storage: Arc<SeaOrmStorage>,
    generator: Arc<dyn CodeGenerator>,
    alphabet: HashSet<char>,
    max_attempts: u32,
    resolved: Cache<String, String>,
}

impl ShortLinkService {
    pub fn new(storage: Arc<SeaOrmStorage>, config: &LinksConfig) -> Result<Self> {
        let generator = Arc::new(RandomCodeGenerator::new(
            config.code_length,
            &config.alphabet,
        ));
        Self::with_generator(storage, config, generator)
    }

    /// 使用自定义短码来源
    pub fn with_generator(
        storage: Arc<SeaOrmStorage>,
        config: &LinksConfig,
        generator: Arc<dyn CodeGenerator>,
    ) -> Result<Self> {
        if config.code_length == 0 || config.code_length > MAX_CODE_LENGTH {
            return Err(FoodgramError::validation(format!(
                "links.code_length must be between 1 and {}",
                MAX_CODE_LENGTH
            )));
        }
        let alphabet: HashSet<char> = config.alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(FoodgramError::validation("links.alphabet must not be empty"));
        }
        if config.max_attempts == 0 {
            return Err(FoodgramError::validation("links.max_attempts must be at least 1"));
        }

        let resolved = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs.max(1)))
            .build();

        Ok(Self {
            storage,
            generator,
            alphabet,
            max_attempts: config.max_attempts,
            resolved,
        })
    }

    /// 短码是否只含配置字符集中的字符
    pub fn is_valid_code(&self, code: &str) -> bool {
        !code.is_empty()
            && code.chars().count() <= MAX_CODE_LENGTH
            && code.chars().all(|c| self.alphabet.contains(&c))
    }

    /// 获取菜谱的短链接，没有则分配一个
    pub async fn get_or_create_link(&self, recipe_id: i32, base_url: &str) -> Result<ShortLinkView> {
        let base = base_url.trim_end_matches('/');

        if self.storage.find_recipe(recipe_id).await?.is_none() {
            return Err(FoodgramError::not_found(format!("Recipe {} not found", recipe_id)));
        }

        if let Some(existing) = self.storage.find_short_link_by_recipe(recipe_id).await? {
            trace!("Reusing short link {} for recipe {}", existing.code, recipe_id);
            return Ok(to_view(existing, base));
        }

        let original_url = format!("{}/recipes/{}", base, recipe_id);

        for attempt in 1..=self.max_attempts {
            let code = self.generator.generate();
            match self
                .storage
                .insert_short_link(recipe_id, &code, &original_url)
                .await
            {
                Ok(model) => {
                    info!(
                        "Short link allocated: {} -> recipe {} (attempt {})",
                        model.code, recipe_id, attempt
                    );
                    return Ok(to_view(model, base));
                }
                Err(e) if is_unique_violation(&e) => {
                    // 同一菜谱被并发分配：返回先写入的那条
                    if let Some(winner) = self.storage.find_short_link_by_recipe(recipe_id).await? {
                        debug!("Recipe {} got its link concurrently", recipe_id);
                        return Ok(to_view(winner, base));
                    }
                    debug!("Code collision on '{}' (attempt {})", code, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "Short code space exhausted for recipe {} after {} attempts",
            recipe_id, self.max_attempts
        );
        Err(FoodgramError::allocation_exhausted(format!(
            "No free short code after {} attempts",
            self.max_attempts
        )))
    }

    /// 短码 -> 原始地址
    pub async fn resolve(&self, code: &str) -> Result<String> {
        if !self.is_valid_code(code) {
            return Err(FoodgramError::not_found(format!("Short link '{}' not found", code)));
        }

        if let Some(url) = self.resolved.get(code).await {
            trace!("Short link cache hit: {}", code);
            return Ok(url);
        }

        match self.storage.find_short_link_by_code(code).await? {
            Some(link) => {
                self.resolved
                    .insert(link.code.clone(), link.original_url.clone())
                    .await;
                Ok(link.original_url)
            }
            None => Err(FoodgramError::not_found(format!("Short link '{}' not found", code))),
        }
    }

    /// 菜谱删除后调用，丢弃已解析的缓存
    pub fn invalidate_cache(&self) {
        self.resolved.invalidate_all();
    }
}

fn to_view(model: short_link::Model, base: &str) -> ShortLinkView {
    ShortLinkView {
        short_url: format!("{}/s/{}", base, model.code),
        recipe_id: model.recipe_id,
        code: model.code,
        original_url: model.original_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_generator_respects_config() {
        let generator = RandomCodeGenerator::new(3, "xyz");
        for _ in 0..50 {
            let code = generator.generate();
            assert_eq!(code.chars().count(), 3);
            assert!(code.chars().all(|c| "xyz".contains(c)));
        }
    }

    #[test]
    fn test_to_view_builds_short_url() {
        let model = short_link::Model {
            id: 1,
            recipe_id: 9,
            code: "aB3".to_string(),
            original_url: "http://host/recipes/9".to_string(),
            created_at: chrono::Utc::now(),
        };
        let view = to_view(model, "http://host");
        assert_eq!(view.short_url, "http://host/s/aB3");
        assert_eq!(view.original_url, "http://host/recipes/9");
    }
}
