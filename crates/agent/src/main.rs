#![forbid(unsafe_code)]

mod cli;
mod commands;
mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adapters::http::HttpAlertApi;
use anyhow::{Context, Result, bail};
use domain::common::entity::Identity;
use infrastructure::config::WatchConfig;
use infrastructure::constants::DEFAULT_CONFIG_PATH;
use infrastructure::logging::init_logging;
use ports::secondary::alert_api::AlertApi;

use cli::{AlertsCommand, Cli, Command, ScopeArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();
    let output = cli.output;

    let config = load_config(&cli)?;
    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format);
    tracing::debug!(config = ?config.sanitized(), "configuration loaded");

    match cli.command {
        Command::Version => {
            println!("trackwatch-agent {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }

        Command::Alerts(args) => {
            let identity = identity_from(&args.scope)?;
            let api = build_api(&config);
            match args.command {
                AlertsCommand::List { unread, limit } => {
                    commands::cmd_alerts_list(api.as_ref(), &identity, unread, limit, output).await
                }
                AlertsCommand::MarkRead { id } => {
                    commands::cmd_alerts_mark_read(api.as_ref(), &identity, &id).await
                }
                AlertsCommand::MarkAllRead => {
                    commands::cmd_alerts_mark_all_read(api.as_ref(), &identity).await
                }
            }
        }

        Command::Watch { scope } => {
            let identity = identity_from(&scope)?;
            watch::run(&config, identity, output).await
        }
    }
}

/// Load the config file, then apply CLI/env overrides.
///
/// A missing file at the default path is not an error; an explicitly
/// given path must exist.
fn load_config(cli: &Cli) -> Result<WatchConfig> {
    let path = Path::new(&cli.config);
    let mut config = if path.exists() {
        WatchConfig::load(path).with_context(|| format!("failed to load config {}", cli.config))?
    } else if cli.config == DEFAULT_CONFIG_PATH {
        WatchConfig::default()
    } else {
        bail!("config file {} does not exist", cli.config);
    };

    if let Some(ref base_url) = cli.base_url {
        config.server.base_url.clone_from(base_url);
    }
    if cli.token.is_some() {
        config.server.token.clone_from(&cli.token);
    }
    config.validate()?;
    Ok(config)
}

fn identity_from(scope: &ScopeArgs) -> Result<Identity> {
    let identity = Identity::new(scope.user.clone(), scope.org.clone());
    identity
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid --user/--org: {e}"))?;
    Ok(identity)
}

fn build_api(config: &WatchConfig) -> Arc<dyn AlertApi> {
    Arc::new(HttpAlertApi::new(
        &config.server.base_url,
        config.server.token.clone(),
        Duration::from_secs(config.server.request_timeout_secs),
    ))
}
