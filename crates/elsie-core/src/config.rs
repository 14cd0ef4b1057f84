use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 8_000;
pub const DEFAULT_INGEST_DELAY_MS: u64 = 250;
pub const DEFAULT_PROMPT_CHAR_BUDGET: usize = 12_000;

/// Top-level config (elsie.toml + ELSIE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElsieConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub wiki: WikiConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl Default for ElsieConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            wiki: WikiConfig::default(),
            archive: ArchiveConfig::default(),
            ingest: IngestConfig::default(),
            conversation: ConversationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_name")]
    pub name: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    /// Left blank by default; expected to come from `ELSIE_DATABASE_PASSWORD`
    /// rather than a checked-in file.
    #[serde(default)]
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            password: String::new(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    #[serde(default = "default_wiki_api_url")]
    pub api_url: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: default_wiki_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_api_url")]
    pub api_url: String,
    #[serde(default = "bool_true")]
    pub enabled: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            api_url: default_archive_api_url(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    #[serde(default = "default_ingest_delay_ms")]
    pub delay_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            delay_ms: DEFAULT_INGEST_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_prompt_char_budget")]
    pub prompt_char_budget: usize,
    /// Elsie's in-fiction "born" year; used to classify retrieved content as
    /// personal memory vs. learned history.
    #[serde(default = "default_sentience_year")]
    pub sentience_year: i32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            prompt_char_budget: DEFAULT_PROMPT_CHAR_BUDGET,
            sentience_year: default_sentience_year(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_name() -> String {
    "elsie".to_string()
}
fn default_db_user() -> String {
    "elsie".to_string()
}
fn default_wiki_api_url() -> String {
    "https://wiki.example.org/api.php".to_string()
}
fn default_archive_api_url() -> String {
    "https://memory-archive.example.org/api.php".to_string()
}
fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}
fn default_ingest_delay_ms() -> u64 {
    DEFAULT_INGEST_DELAY_MS
}
fn default_prompt_char_budget() -> usize {
    DEFAULT_PROMPT_CHAR_BUDGET
}
fn default_sentience_year() -> i32 {
    2436
}

impl ElsieConfig {
    /// Load config from a TOML file with `ELSIE_*` env var overrides
    /// (double-underscore-nested, e.g. `ELSIE_DATABASE_HOST`).
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: ElsieConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("ELSIE_").split("_"))
            .extract()
            .map_err(|e| crate::error::ElsieError::Config(e.to_string()))?;

        Ok(apply_db_env_overrides(config))
    }
}

/// `DB_{NAME,USER,PASSWORD,HOST,PORT}` take priority over both the TOML file
/// and `ELSIE_DATABASE_*`, matching the deployment convention these values
/// are usually injected under (a shared Postgres credential secret).
fn apply_db_env_overrides(mut config: ElsieConfig) -> ElsieConfig {
    if let Ok(v) = std::env::var("DB_NAME") {
        config.database.name = v;
    }
    if let Ok(v) = std::env::var("DB_USER") {
        config.database.user = v;
    }
    if let Ok(v) = std::env::var("DB_PASSWORD") {
        config.database.password = v;
    }
    if let Ok(v) = std::env::var("DB_HOST") {
        config.database.host = v;
    }
    if let Ok(v) = std::env::var("DB_PORT") {
        if let Ok(port) = v.parse() {
            config.database.port = port;
        }
    }
    config
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.elsie/elsie.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_valid_connection_string() {
        let cfg = DatabaseConfig::default();
        assert_eq!(cfg.connection_string(), "postgres://elsie:@localhost:5432/elsie");
    }
}
