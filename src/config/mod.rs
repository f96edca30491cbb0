// dbrestore/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_RESTORE_TIMEOUT_SECS: u64 = 1800;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3306;
const DEFAULT_USERNAME: &str = "root";
const DEFAULT_DATABASE: &str = "laravel";
const DEFAULT_STORAGE_ROOT: &str = "storage/app";
const DEFAULT_BACKUP_ROOTS: &[&str] = &["storage/app/backups", "storage/backups"];
const DEFAULT_LOG_DIR: &str = "storage/logs";

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonDatabaseConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub client_bin_dir: Option<PathBuf>,
    pub client_flavor: Option<ClientFlavor>,
    pub protocol: Option<String>,
    pub socket: Option<String>,
    pub restore_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub database: Option<JsonDatabaseConfig>,
    pub storage_root: Option<PathBuf>,
    pub backup_roots: Option<Vec<PathBuf>>,
    pub scratch_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

/// Which database client executable to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientFlavor {
    #[default]
    Auto,
    Mysql,
    Mariadb,
}

impl ClientFlavor {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(ClientFlavor::Auto),
            "mysql" => Ok(ClientFlavor::Mysql),
            "mariadb" => Ok(ClientFlavor::Mariadb),
            other => Err(anyhow::anyhow!(
                "Unknown database client flavor '{}'; expected auto, mysql or mariadb",
                other
            )),
        }
    }
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub client_bin_dir: Option<PathBuf>,
    pub client_flavor: ClientFlavor,
    /// Raw protocol override; interpreted by the connection resolver.
    pub protocol: Option<String>,
    pub socket: Option<String>,
    pub restore_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RestoreSettings {
    pub database: DatabaseSettings,
    /// Primary root that relative archive references are resolved against.
    pub storage_root: PathBuf,
    /// Known backup directories probed in order by bare file name.
    pub backup_roots: Vec<PathBuf>,
    /// Parent directory for per-run workspaces.
    pub scratch_dir: PathBuf,
    /// Where shell-redirect diagnostic files are written.
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub restore: RestoreSettings,
}

impl AppConfig {
    /// Loads `config_path` if it exists, applies environment overrides and resolves defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut raw_config = if config_path.exists() {
            let config_content = fs::read_to_string(config_path).with_context(|| {
                format!("Failed to read config file at {}", config_path.display())
            })?;
            parse_raw_config(&config_content).with_context(|| {
                format!(
                    "Failed to parse JSON from config file at {}",
                    config_path.display()
                )
            })?
        } else {
            tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
            RawJsonConfig::default()
        };

        apply_env_overrides(&mut raw_config, |key| std::env::var(key).ok())?;
        let restore = resolve_settings(&raw_config)?;

        Ok(AppConfig { restore })
    }
}

pub fn parse_raw_config(content: &str) -> Result<RawJsonConfig> {
    serde_json::from_str(content).context("Invalid config JSON")
}

/// Overlays values from `lookup` (normally the process environment) onto the file config.
pub fn apply_env_overrides<F>(raw: &mut RawJsonConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let db = raw.database.get_or_insert_with(JsonDatabaseConfig::default);

    if let Some(v) = get("DB_HOST") {
        db.host = Some(v);
    }
    if let Some(v) = get("DB_PORT") {
        db.port = Some(
            v.trim()
                .parse()
                .with_context(|| format!("DB_PORT must be a port number, got '{}'", v))?,
        );
    }
    if let Some(v) = get("DB_DATABASE") {
        db.database = Some(v);
    }
    if let Some(v) = get("DB_USERNAME") {
        db.username = Some(v);
    }
    // An empty password is a legitimate value, so it is not filtered.
    if let Some(v) = lookup("DB_PASSWORD") {
        db.password = Some(v);
    }
    if let Some(v) = get("DB_CLIENT_BIN_DIR") {
        db.client_bin_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = get("DB_CLIENT_FLAVOR") {
        db.client_flavor = Some(ClientFlavor::parse(&v)?);
    }
    if let Some(v) = get("DB_PROTOCOL") {
        db.protocol = Some(v);
    }
    if let Some(v) = get("DB_SOCKET") {
        db.socket = Some(v);
    }
    if let Some(v) = get("DB_RESTORE_TIMEOUT") {
        db.restore_timeout_secs = Some(v.trim().parse().with_context(|| {
            format!("DB_RESTORE_TIMEOUT must be a number of seconds, got '{}'", v)
        })?);
    }

    if let Some(v) = get("BACKUP_STORAGE_ROOT") {
        raw.storage_root = Some(PathBuf::from(v));
    }
    if let Some(v) = get("BACKUP_ROOTS") {
        raw.backup_roots = Some(parse_path_list(&v));
    }
    if let Some(v) = get("RESTORE_SCRATCH_DIR") {
        raw.scratch_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = get("RESTORE_LOG_DIR") {
        raw.log_dir = Some(PathBuf::from(v));
    }
    Ok(())
}

/// Splits a `,`/`;` separated list of directories, dropping empty entries.
fn parse_path_list(value: &str) -> Vec<PathBuf> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

pub fn resolve_settings(raw: &RawJsonConfig) -> Result<RestoreSettings> {
    let db = raw.database.clone().unwrap_or_default();

    let database = db.database.unwrap_or_else(|| DEFAULT_DATABASE.to_string());
    if database.trim().is_empty() {
        return Err(anyhow::anyhow!("database name cannot be empty"));
    }
    let restore_timeout_secs = db.restore_timeout_secs.unwrap_or(DEFAULT_RESTORE_TIMEOUT_SECS);
    if restore_timeout_secs == 0 {
        return Err(anyhow::anyhow!("restore timeout must be greater than zero seconds"));
    }

    let backup_roots = match &raw.backup_roots {
        Some(roots) => roots.clone(),
        None => DEFAULT_BACKUP_ROOTS.iter().map(PathBuf::from).collect(),
    };

    Ok(RestoreSettings {
        database: DatabaseSettings {
            host: db.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: db.port.unwrap_or(DEFAULT_PORT),
            username: db.username.unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: db.password.unwrap_or_default(),
            database,
            client_bin_dir: db.client_bin_dir.filter(|p| !p.as_os_str().is_empty()),
            client_flavor: db.client_flavor.unwrap_or_default(),
            protocol: db.protocol.filter(|s| !s.trim().is_empty()),
            socket: db.socket.filter(|s| !s.trim().is_empty()),
            restore_timeout_secs,
        },
        storage_root: raw
            .storage_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT)),
        backup_roots,
        scratch_dir: raw.scratch_dir.clone().unwrap_or_else(std::env::temp_dir),
        log_dir: raw
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
    })
}
