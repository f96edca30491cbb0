//! Database Restore Tool
//!
//! Restores a MySQL/MariaDB database from a backup archive (zip, tar or gzip-compressed SQL).

// dbrestore/src/main.rs
mod config;
mod errors;
mod restore;

use anyhow::{Context, Result};
use config::{AppConfig, DEFAULT_CONFIG_FILE};
use restore::logic::RestoreOutcome;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Main entry point for the restore tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dbrestore=info")),
        )
        .with_target(false)
        .init();

    match run_app().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the requested operation ran but did not succeed.
async fn run_app() -> Result<bool> {
    let config_path = env::var("DBRESTORE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let app_config = AppConfig::load(&config_path).context(format!(
        "Failed to load application configuration from {}",
        config_path.display()
    ))?;

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(|a| a.trim().to_string());

    match command.as_deref() {
        Some("list") => {
            list_archives(&app_config);
            Ok(true)
        }
        Some("restore") => {
            let reference = match args.get(1) {
                Some(reference) => reference.trim().to_string(),
                None => prompt_reference()?,
            };
            run_restore(&app_config, &reference).await
        }
        None => {
            let reference = prompt_reference()?;
            run_restore(&app_config, &reference).await
        }
        Some(other) => {
            println!("❌ Unknown command '{}'. Use 'restore <archive>' or 'list'.", other);
            anyhow::bail!("Invalid command");
        }
    }
}

async fn run_restore(app_config: &AppConfig, reference: &str) -> Result<bool> {
    if reference.is_empty() {
        anyhow::bail!("No archive reference given");
    }
    println!("🔄 Restoring '{}' into database '{}'...", reference, app_config.restore.database.database);

    let outcome = restore::run_restore_flow(app_config, reference).await;
    for line in outcome_lines(&outcome) {
        println!("{}", line);
    }
    Ok(outcome.succeeded)
}

/// Status lines for the terminal. Client output stays in the logs.
fn outcome_lines(outcome: &RestoreOutcome) -> Vec<String> {
    if outcome.succeeded {
        return vec![format!("✅ {}", outcome.message())];
    }
    let mut lines = vec![format!("❌ {}", outcome.message())];
    if let Some(code) = outcome.exit_code {
        lines.push(format!("   Database client exit code: {}", code));
    }
    if let Some(log) = &outcome.diagnostic_file {
        lines.push(format!("   Client log: {}", log.display()));
    }
    lines
}

fn list_archives(app_config: &AppConfig) {
    let archives = restore::list_available_archives(app_config);
    if archives.is_empty() {
        println!("No backup archives found.");
        return;
    }
    for archive in archives {
        let modified = archive
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:>12}  {:<7}  {}",
            modified,
            format_size(archive.size_bytes),
            archive.kind.label(),
            archive.path.display()
        );
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Prompts the user for the archive to restore
fn prompt_reference() -> Result<String> {
    use std::io::{stdin, stdout, Write};

    println!("Available backups can be shown with 'dbrestore list'.");
    print!("Enter the backup archive to restore: ");
    stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    stdin().read_line(&mut input).context("Failed to read user input")?;
    Ok(input.trim().to_string())
}
