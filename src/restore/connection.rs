// dbrestore/src/restore/connection.rs
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{ClientFlavor, DatabaseSettings};

/// Conventional named-pipe identifier of a local MySQL/MariaDB server on Windows.
pub const DEFAULT_PIPE_NAME: &str = "MySQL";
pub const RESTORE_CHARSET: &str = "utf8mb4";
pub const RESTORE_COLLATION: &str = "utf8mb4_unicode_ci";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Unix,
}

impl OsFamily {
    pub fn current() -> Self {
        if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Unix
        }
    }

    fn separator(self) -> char {
        match self {
            OsFamily::Windows => '\\',
            OsFamily::Unix => '/',
        }
    }
}

/// Transport used to reach the database server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolMode {
    Tcp,
    Pipe,
    SocketPath,
}

impl ProtocolMode {
    /// Interprets a protocol override. Anything unrecognised means TCP.
    pub fn from_override(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("pipe" | "named-pipe" | "namedpipe") => ProtocolMode::Pipe,
            Some("socket" | "unix" | "unix-socket") => ProtocolMode::SocketPath,
            _ => ProtocolMode::Tcp,
        }
    }

    /// Value for the client's `--protocol=` option.
    pub fn client_value(self) -> &'static str {
        match self {
            ProtocolMode::Tcp => "TCP",
            ProtocolMode::Pipe => "PIPE",
            ProtocolMode::SocketPath => "SOCKET",
        }
    }
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.client_value())
    }
}

/// Everything needed to invoke the database client for one attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    pub client_binary: PathBuf,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub protocol_mode: ProtocolMode,
    pub socket_or_pipe_name: Option<String>,
    pub timeout_secs: u64,
}

impl fmt::Debug for ConnectionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPlan")
            .field("client_binary", &self.client_binary)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("protocol_mode", &self.protocol_mode)
            .field("socket_or_pipe_name", &self.socket_or_pipe_name)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConnectionPlan {
    /// Copy of this plan using `protocol_mode`; `self` is left untouched.
    pub fn with_protocol(&self, protocol_mode: ProtocolMode, socket_or_pipe_name: Option<String>) -> Self {
        Self {
            protocol_mode,
            socket_or_pipe_name,
            ..self.clone()
        }
    }

    /// Connection arguments shared by the preflight and the restore invocations.
    pub fn connection_args(&self) -> Vec<String> {
        let mut args = vec![format!("--user={}", self.user)];
        if !self.password.is_empty() {
            args.push(format!("--password={}", self.password));
        }
        match self.protocol_mode {
            ProtocolMode::Tcp => {
                args.push(format!("--host={}", self.host));
                args.push(format!("--port={}", self.port));
                args.push("--protocol=TCP".to_string());
            }
            ProtocolMode::Pipe | ProtocolMode::SocketPath => {
                args.push(format!("--protocol={}", self.protocol_mode.client_value()));
                if let Some(name) = &self.socket_or_pipe_name {
                    args.push(format!("--socket={}", name));
                }
            }
        }
        args
    }

    /// Full argument vector for replaying a dump into the target database.
    pub fn restore_args(&self) -> Vec<String> {
        let mut args = self.connection_args();
        args.push("--force".to_string());
        args.push(format!("--default-character-set={}", RESTORE_CHARSET));
        args.push(self.database.clone());
        args
    }

    /// Arguments for a one-shot `CREATE DATABASE IF NOT EXISTS`.
    pub fn ensure_database_args(&self) -> Vec<String> {
        let mut args = self.connection_args();
        args.push(format!("--default-character-set={}", RESTORE_CHARSET));
        args.push("-e".to_string());
        args.push(format!(
            "CREATE DATABASE IF NOT EXISTS `{}` CHARACTER SET {} COLLATE {}",
            self.database.replace('`', "``"),
            RESTORE_CHARSET,
            RESTORE_COLLATION
        ));
        args
    }
}

/// Builds the plan for `settings` on `os`.
///
/// `is_available` answers whether a client binary path can be executed; it is
/// only consulted to choose between mysql and mariadb when the flavor is auto.
pub fn resolve_plan<F>(settings: &DatabaseSettings, os: OsFamily, is_available: F) -> ConnectionPlan
where
    F: Fn(&Path) -> bool,
{
    let candidate = |name: &str| binary_path(settings.client_bin_dir.as_deref(), name, os);

    let client_binary = match settings.client_flavor {
        ClientFlavor::Mysql => candidate("mysql"),
        ClientFlavor::Mariadb => candidate("mariadb"),
        ClientFlavor::Auto => {
            let mysql = candidate("mysql");
            let mariadb = candidate("mariadb");
            if !is_available(&mysql) && is_available(&mariadb) {
                mariadb
            } else {
                mysql
            }
        }
    };

    let protocol_mode = ProtocolMode::from_override(settings.protocol.as_deref());

    ConnectionPlan {
        client_binary,
        host: settings.host.clone(),
        port: settings.port,
        user: settings.username.clone(),
        password: settings.password.clone(),
        database: settings.database.clone(),
        protocol_mode,
        socket_or_pipe_name: settings.socket.clone(),
        timeout_secs: settings.restore_timeout_secs,
    }
}

/// Default availability probe: an explicit path must exist, a bare name must be on PATH.
pub fn client_on_system(path: &Path) -> bool {
    if path.components().count() > 1 {
        path.is_file()
    } else {
        which::which(path).is_ok()
    }
}

fn binary_path(dir: Option<&Path>, name: &str, os: OsFamily) -> PathBuf {
    let file_name = match os {
        OsFamily::Windows => format!("{}.exe", name),
        OsFamily::Unix => name.to_string(),
    };
    let Some(dir) = dir else {
        return PathBuf::from(file_name);
    };

    let sep = os.separator();
    let normalized: String = dir
        .to_string_lossy()
        .chars()
        .map(|c| if c == '/' || c == '\\' { sep } else { c })
        .collect();
    let trimmed = normalized.trim_end_matches(sep);
    if trimmed.is_empty() {
        // The directory was the filesystem root.
        return PathBuf::from(format!("{}{}", sep, file_name));
    }
    PathBuf::from(format!("{}{}{}", trimmed, sep, file_name))
}
