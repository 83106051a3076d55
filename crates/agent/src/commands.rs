use anyhow::Result;
use application::snapshot::load_snapshot;
use domain::alert::entity::{AlertId, AlertRecord};
use domain::common::entity::Identity;
use ports::secondary::alert_api::AlertApi;

use crate::cli::OutputFormat;

pub async fn cmd_alerts_list(
    api: &dyn AlertApi,
    identity: &Identity,
    unread_only: bool,
    limit: usize,
    output: OutputFormat,
) -> Result<()> {
    let records = load_snapshot(api, identity).await?;
    let records: Vec<AlertRecord> = records
        .into_iter()
        .filter(|r| !unread_only || !r.is_read)
        .take(limit)
        .collect();

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No alerts found.");
        return Ok(());
    }

    print_alert_table(&records);
    println!("\n{} alert(s).", records.len());
    Ok(())
}

pub async fn cmd_alerts_mark_read(
    api: &dyn AlertApi,
    identity: &Identity,
    id: &str,
) -> Result<()> {
    api.mark_read(identity, &AlertId(id.to_string())).await?;
    println!("Alert {id} marked read.");
    Ok(())
}

pub async fn cmd_alerts_mark_all_read(api: &dyn AlertApi, identity: &Identity) -> Result<()> {
    api.mark_all_read(identity).await?;
    println!("All alerts marked read.");
    Ok(())
}

pub fn print_alert_table(records: &[AlertRecord]) {
    println!(
        "{:<26}  {:<16}  {:<14}  {:<6}  {:<14}  {:<40}",
        "ID", "CATEGORY", "ASSET", "READ", "TIMESTAMP", "DESCRIPTION"
    );
    for rec in records {
        println!(
            "{:<26}  {:<16}  {:<14}  {:<6}  {:<14}  {:<40}",
            truncate(&rec.id.0, 26),
            rec.category.as_str(),
            truncate(&rec.asset_id, 14),
            if rec.is_read { "yes" } else { "no" },
            rec.timestamp_ms,
            truncate(&rec.describe(), 40),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}
