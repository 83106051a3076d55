use std::sync::Arc;
use std::time::Duration;

use adapters::http::{HttpAlertApi, HttpPushChannel};
use anyhow::Result;
use application::subscriber::AlertSubscriber;
use domain::common::entity::Identity;
use infrastructure::config::WatchConfig;
use infrastructure::constants::GRACEFUL_SHUTDOWN_TIMEOUT;
use ports::secondary::alert_api::AlertApi;
use ports::secondary::push_channel::PushChannel;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::commands::print_alert_table;

/// How many of the newest alerts to show on each feed change.
const WATCH_DISPLAY_LIMIT: usize = 5;

/// Follow the live alert feed for one identity until SIGINT/SIGTERM.
///
/// Re-renders on every feed change notification rather than polling.
pub async fn run(config: &WatchConfig, identity: Identity, output: OutputFormat) -> Result<()> {
    let api: Arc<dyn AlertApi> = Arc::new(HttpAlertApi::new(
        &config.server.base_url,
        config.server.token.clone(),
        Duration::from_secs(config.server.request_timeout_secs),
    ));
    let channel: Arc<dyn PushChannel> = Arc::new(HttpPushChannel::new(
        &config.server.base_url,
        config.server.token.clone(),
        Duration::from_secs(config.server.connect_timeout_secs),
    ));
    let subscriber = AlertSubscriber::new(
        api,
        channel,
        Duration::from_secs(config.sync.reconnect_delay_secs),
    );

    let shutdown = shutdown_token();
    let mut changes = subscriber.changes();
    subscriber.activate(identity.clone()).await;
    tracing::info!(
        identity = %identity,
        url = %config.server.base_url,
        "watching alert feed"
    );

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&subscriber, output).await?;
            }
        }
    }

    tracing::info!("shutting down");
    let _ = tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, subscriber.deactivate()).await;
    Ok(())
}

/// Token cancelled by the first SIGINT or SIGTERM.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = signal::ctrl_c().await;
        }
        handle.cancel();
    });

    token
}

async fn render(subscriber: &AlertSubscriber, output: OutputFormat) -> Result<()> {
    let records = subscriber.records().await;
    let unread = subscriber.unread_count().await;
    let state = subscriber.connection_state().await;

    if output == OutputFormat::Json {
        let newest: Vec<_> = records.iter().take(WATCH_DISPLAY_LIMIT).collect();
        let line = serde_json::json!({
            "connection": state.as_str(),
            "total": records.len(),
            "unread": unread,
            "loading": subscriber.is_loading(),
            "load_error": subscriber.has_load_error(),
            "newest": newest,
        });
        println!("{line}");
        return Ok(());
    }

    println!(
        "[{}] {} alert(s), {} unread{}",
        state.as_str(),
        records.len(),
        unread,
        if subscriber.has_load_error() {
            " (history unavailable)"
        } else {
            ""
        }
    );
    let newest = &records[..records.len().min(WATCH_DISPLAY_LIMIT)];
    if !newest.is_empty() {
        print_alert_table(newest);
    }
    Ok(())
}
