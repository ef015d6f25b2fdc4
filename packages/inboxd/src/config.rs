use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

// =============================================================================
// Unified config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
// Two equivalent ways to configure:
//
//   config.toml:     [database]
//                    backend = "document"
//
//   env var:         INBOXD_DATABASE__BACKEND=document   (double underscore = nesting)

/// Which backing representation the store uses. Both expose the same logical
/// operations through the `ConversationStore` trait.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A `contacts` table joined to a `messages` table.
    #[default]
    Relational,
    /// One JSON document per row, queried through `json_extract`.
    Document,
}

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub database: DatabaseFileConfig,
}

/// Server tuning knobs (lives under `[server]` in config.toml).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Database knobs (lives under `[database]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseFileConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseFileConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Build a figment that layers: struct defaults → config.toml → INBOXD_* env vars.
///
/// Env vars use double-underscore for nesting into sections:
///   `INBOXD_DATABASE__BACKEND=document`  →  `database.backend = "document"`
///   `INBOXD_SERVER__PORT=8080`           →  `server.port = 8080`
pub fn load_config(data_dir: &Path) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(data_dir.join("config.toml")))
        .merge(Env::prefixed("INBOXD_").split("__"))
}

/// Resolved runtime configuration: data directory, database path, and the
/// figment-extracted tunables.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub file: FileConfig,
}

impl AppConfig {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = custom_dir.unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".inboxd")
        });

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

        let file: FileConfig = load_config(&data_dir)
            .extract()
            .context("Failed to load configuration")?;

        let db_path = data_dir.join("inboxd.db");
        info!("Data directory: {}", data_dir.display());

        Ok(Self {
            data_dir,
            db_path,
            file,
        })
    }

    pub fn db_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.db_path.display())
    }

    pub fn host(&self) -> &str {
        self.file.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.file.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn reset_database(&self) -> Result<()> {
        if self.db_path.exists() {
            std::fs::remove_file(&self.db_path)
                .with_context(|| format!("Failed to delete database: {:?}", self.db_path))?;
            info!("Database reset: {:?}", self.db_path);
        }
        // WAL sidecar files, if present
        for ext in ["db-wal", "db-shm"] {
            let path = self.db_path.with_extension(ext);
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let fc: FileConfig = load_config(tmp.path()).extract().unwrap();
        assert_eq!(fc.database.backend, Backend::Relational);
        assert_eq!(fc.database.max_connections, 5);
        assert!(fc.server.host.is_none());
        assert!(fc.server.port.is_none());
    }

    #[test]
    fn config_toml_sets_values() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[server]\nhost = \"0.0.0.0\"\nport = 8080\n\n[database]\nbackend = \"document\"\n",
        )
        .unwrap();
        let fc: FileConfig = load_config(tmp.path()).extract().unwrap();
        assert_eq!(fc.server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(fc.server.port, Some(8080));
        assert_eq!(fc.database.backend, Backend::Document);
    }

    #[test]
    fn app_config_with_custom_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::new(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.data_dir, tmp.path());
        assert_eq!(config.db_path, tmp.path().join("inboxd.db"));
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.port(), DEFAULT_PORT);
    }

    #[test]
    fn db_url_format() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::new(Some(tmp.path().to_path_buf())).unwrap();
        let url = config.db_url();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("inboxd.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn reset_database_removes_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::new(Some(tmp.path().to_path_buf())).unwrap();
        std::fs::write(&config.db_path, "fake db").unwrap();
        let wal = config.db_path.with_extension("db-wal");
        std::fs::write(&wal, "wal").unwrap();

        config.reset_database().unwrap();

        assert!(!config.db_path.exists());
        assert!(!wal.exists());
    }

    #[test]
    fn reset_database_no_file_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::new(Some(tmp.path().to_path_buf())).unwrap();
        config.reset_database().unwrap();
    }
}
