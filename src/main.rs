use clap::Parser;
use proctor_assign::error::{ConfigError, StoreError};
use proctor_assign::{Dataset, EngineConfig, InMemoryStore, Runner};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Assign proctors to a session's exams from a JSON dataset.
#[derive(Debug, Parser)]
#[command(name = "proctor_assign", version)]
struct Cli {
    /// Dataset with exams, proctors, availabilities, room constraints and attributions.
    dataset: PathBuf,
    /// Session to assign; defaults to the dataset's active session.
    #[arg(long)]
    session: Option<u32>,
    /// Write the dataset with the new assignments to this file.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Log filter to start with; a broken configuration still gets its error logged.
fn log_filter(config: &Result<EngineConfig, ConfigError>) -> &str {
    match config {
        Ok(config) => &config.log_level,
        Err(_) => "info",
    }
}

fn run(cli: Cli) -> Result<bool, CliError> {
    let config = EngineConfig::load();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&config)))
        .init();
    let config = config?;

    let raw = std::fs::read_to_string(&cli.dataset).map_err(|source| CliError::Io {
        path: cli.dataset.clone(),
        source,
    })?;
    let dataset: Dataset = serde_json::from_str(&raw)?;

    let runner = Runner::new(Arc::new(InMemoryStore::new(dataset)), config);
    let result = match cli.session {
        Some(session_id) => runner.run(session_id),
        None => runner.run_active(),
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(path) = cli.output {
        let snapshot = runner.store().snapshot()?;
        std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)
            .map_err(|source| CliError::Io { path, source })?;
    }

    Ok(result.success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_follows_config() {
        let config = EngineConfig {
            log_level: "debug".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(log_filter(&Ok(config)), "debug");
    }

    #[test]
    fn log_filter_falls_back_on_config_error() {
        let config = Err(ConfigError::InvalidNumber {
            key: "PROCTOR_DEFAULT_QUOTA",
            value: "many".to_string(),
        });
        assert_eq!(log_filter(&config), "info");
    }
}
