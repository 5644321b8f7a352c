use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thaifood_corpus::{
    SearchTextPolicy, CATEGORY_FIELD, DEFAULT_SEPARATOR, DISH_NAME_FIELD, INGREDIENTS_FIELD,
};
use thaifood_vector_store::{EmbeddingMode, DEFAULT_DIMENSION};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "thaifood.toml";

const DEFAULT_MODEL_ID: &str = "Chanisorn/thai-food-mpnet-new-v8";
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/embed";

/// Settings for one CLI process.
///
/// Sources, lowest priority first: built-in defaults, the TOML file,
/// `THAIFOOD_*` environment variables, then command-line flags. The embedding
/// service token is never stored here; only the name of the environment
/// variable that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub corpus_path: PathBuf,
    pub search_fields: Vec<String>,
    pub separator: String,
    /// Field shown as the result title
    pub name_field: String,
    /// Fields shown under the title, one line each, when present
    pub detail_fields: Vec<String>,
    pub top_k: usize,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// `stub` or `http`
    pub mode: EmbeddingMode,
    pub model_id: String,
    pub dimension: usize,
    pub endpoint: String,
    pub token_env: String,
    pub timeout_ms: u64,
    pub max_batch: usize,
    pub query_cache: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = SearchTextPolicy::thai_food();
        Self {
            corpus_path: PathBuf::from("thai_food.json"),
            search_fields: policy.fields,
            separator: DEFAULT_SEPARATOR.to_string(),
            name_field: DISH_NAME_FIELD.to_string(),
            detail_fields: vec![INGREDIENTS_FIELD.to_string(), CATEGORY_FIELD.to_string()],
            top_k: 3,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Http,
            model_id: DEFAULT_MODEL_ID.to_string(),
            dimension: DEFAULT_DIMENSION,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_env: "HF_TOKEN".to_string(),
            timeout_ms: 30_000,
            max_batch: 32,
            query_cache: 256,
        }
    }
}

impl AppConfig {
    /// Reads `path` if given (it must exist), otherwise `thaifood.toml` when
    /// present, otherwise defaults. Environment overrides are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Applies `THAIFOOD_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup("THAIFOOD_CORPUS") {
            self.corpus_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("THAIFOOD_TOP_K") {
            self.top_k = parse_number("THAIFOOD_TOP_K", &raw)?;
        }
        if let Some(mode) = lookup("THAIFOOD_EMBEDDING_MODE") {
            self.embedding.mode = mode
                .parse::<EmbeddingMode>()
                .context("Invalid THAIFOOD_EMBEDDING_MODE")?;
        }
        if let Some(model) = lookup("THAIFOOD_MODEL_ID") {
            self.embedding.model_id = model;
        }
        if let Some(endpoint) = lookup("THAIFOOD_EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = endpoint;
        }
        if let Some(raw) = lookup("THAIFOOD_EMBEDDING_DIMENSION") {
            self.embedding.dimension = parse_number("THAIFOOD_EMBEDDING_DIMENSION", &raw)?;
        }
        if let Some(raw) = lookup("THAIFOOD_EMBEDDING_TIMEOUT_MS") {
            self.embedding.timeout_ms = parse_number("THAIFOOD_EMBEDDING_TIMEOUT_MS", &raw)?;
        }
        Ok(())
    }

    pub fn policy(&self) -> Result<SearchTextPolicy> {
        let policy = SearchTextPolicy::new(&self.search_fields)
            .context("Invalid search_fields in config")?;
        Ok(policy.with_separator(self.separator.clone()))
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Result<Duration> {
        if self.timeout_ms == 0 {
            bail!("embedding.timeout_ms must be greater than zero");
        }
        Ok(Duration::from_millis(self.timeout_ms))
    }

    /// Bearer token from the configured environment variable, if set.
    pub fn token(&self) -> Option<String> {
        env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_thai_food_dataset() {
        let config = AppConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.name_field, "ชื่ออาหาร");
        assert_eq!(
            config.search_fields,
            vec!["วัตถุดิบ_ไม่มีปริมาณ", "query1 อยากกินอาหารครบ"]
        );
        assert_eq!(config.embedding.token_env, "HF_TOKEN");
        assert_eq!(config.embedding.mode, EmbeddingMode::Http);
    }

    #[test]
    fn toml_overrides_only_what_it_names() {
        let config: AppConfig = toml::from_str(
            r#"
            top_k = 5
            search_fields = ["name", "ingredients"]

            [embedding]
            mode = "stub"
            dimension = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.embedding.mode, EmbeddingMode::Stub);
        assert_eq!(config.embedding.dimension, 64);
        assert_eq!(config.embedding.max_batch, 32);
        assert_eq!(config.name_field, "ชื่ออาหาร");
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<AppConfig>("api_token = \"leak\"").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_of(&[
                ("THAIFOOD_TOP_K", "7"),
                ("THAIFOOD_EMBEDDING_MODE", "stub"),
                ("THAIFOOD_CORPUS", "/data/menu.json"),
                ("THAIFOOD_MODEL_ID", ""),
            ]))
            .unwrap();
        assert_eq!(config.top_k, 7);
        assert_eq!(config.embedding.mode, EmbeddingMode::Stub);
        assert_eq!(config.corpus_path, PathBuf::from("/data/menu.json"));
        assert_eq!(config.embedding.model_id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn misspelled_embedding_mode_fails_at_load() {
        let err = toml::from_str::<AppConfig>("[embedding]\nmode = \"stbu\"\n").unwrap_err();
        assert!(err.to_string().contains("stbu"), "{err}");

        let mut config = AppConfig::default();
        let err = config
            .apply_env(env_of(&[("THAIFOOD_EMBEDDING_MODE", "onnx")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("onnx"), "{err:#}");
    }

    #[test]
    fn malformed_env_numbers_are_reported() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env_of(&[("THAIFOOD_TOP_K", "three")]))
            .unwrap_err();
        assert!(err.to_string().contains("THAIFOOD_TOP_K"), "{err}");
    }

    #[test]
    fn empty_search_fields_are_rejected() {
        let config = AppConfig {
            search_fields: Vec::new(),
            ..AppConfig::default()
        };
        assert!(config.policy().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let embedding = EmbeddingConfig {
            timeout_ms: 0,
            ..EmbeddingConfig::default()
        };
        assert!(embedding.timeout().is_err());
    }
}
