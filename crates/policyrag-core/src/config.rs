use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::error::ConfigError;

/// Raw layered configuration. Use [`Config::settings`] for the typed view.
pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Merge defaults, `config.toml`, `config.<env>.toml` from `dir`, then `APP_*` vars.
    pub fn load_from(dir: &Path, env_name: &str) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::layer_defaults())).merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| ConfigError::Invalid(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self.figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
    pub retrieval: RetrievalConfig,
    pub agent: AgentConfig,
    pub server: ServerConfig,
    /// Domain name to collection name. Fixed for the process lifetime.
    /// A configured table replaces the built-in mapping as a whole.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub domains: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub use_fake: bool,
    pub fake_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Azure OpenAI style `api-key: <key>`
    ApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Full chat-completions URL.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub auth: AuthScheme,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Collection used by the single-domain `/ask` flow.
    pub collection: String,
    pub top_k: usize,
    pub chunk_size: usize,
    pub write_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub temperature: f32,
    /// Wall-clock budget for one routed question. `None` disables it.
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let domains = [("leave", "leave_policy"), ("travel", "travel_policy"), ("harass", "harass_policy")]
            .into_iter()
            .map(|(d, c)| (d.to_string(), c.to_string()))
            .collect();
        Self {
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
            retrieval: RetrievalConfig::default(),
            agent: AgentConfig::default(),
            server: ServerConfig::default(),
            domains,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: "data/lancedb".to_string() }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model: "BAAI/bge-base-en-v1.5".to_string(), model_dir: None, max_len: 512, use_fake: false, fake_dim: 768 }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/v1/chat/completions".to_string(),
            api_key: None,
            auth: AuthScheme::Bearer,
            model: "gpt-4".to_string(),
            max_tokens: 500,
            temperature: 0.3,
            timeout_secs: 30,
            system_prompt: "You are an assistant on leave policy.".to_string(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { collection: "leave_policy_pdfs".to_string(), top_k: 5, chunk_size: DEFAULT_CHUNK_SIZE, write_batch_size: 256 }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_iterations: 3, temperature: 0.2, deadline_secs: None }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 5000, max_body_bytes: 64 * 1024 }
    }
}

impl Settings {
    /// Defaults for the figment base layer. `domains` is left out so figment's
    /// per-key dictionary merge cannot keep built-in domains alongside configured ones.
    fn layer_defaults() -> Self {
        Self { domains: BTreeMap::new(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.chunk_size == 0 {
            return Err(ConfigError::Invalid("retrieval.chunk_size must be > 0".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".into()));
        }
        if self.retrieval.write_batch_size == 0 {
            return Err(ConfigError::Invalid("retrieval.write_batch_size must be > 0".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::Invalid("agent.max_iterations must be > 0".into()));
        }
        if self.domains.is_empty() {
            return Err(ConfigError::Invalid("at least one domain must be mapped to a collection".into()));
        }
        if let Some((domain, _)) = self.domains.iter().find(|(_, c)| c.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("domain '{}' has an empty collection name", domain)));
        }
        if self.embedding.use_fake && self.embedding.fake_dim == 0 {
            return Err(ConfigError::Invalid("embedding.fake_dim must be > 0".into()));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        expand_path(&self.store.path)
    }

    pub fn collection_for(&self, domain: &str) -> Option<&str> {
        self.domains.get(domain).map(String::as_str)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
