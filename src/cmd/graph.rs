//! `graph users|devices|groups`: plain Graph listings

use crate::cmd::render::{print_table, text_field};
use crate::cmd::warn_limitations;
use crate::config::AppConfig;
use crate::error::Result;
use crate::graph::{GraphClient, Limitations, PaginatedResponse, safe};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum number of items to return
    #[arg(long, default_value = "10")]
    pub top: usize,
}

fn print_or_empty(title: &str, headers: &[&str], items: &[Value], row: fn(&Value) -> Vec<String>) {
    if items.is_empty() {
        println!("{}", format!("No {} returned.", title.to_lowercase()).dimmed());
        return;
    }
    let rows: Vec<Vec<String>> = items.iter().map(row).collect();
    print_table(title, headers, &rows);
}

pub async fn users(config: &AppConfig, args: ListArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let page = safe(
        || graph.get_users(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await;
    warn_limitations(&limitations);

    print_or_empty(
        "Users",
        &["Display Name", "User Principal Name", "Id"],
        &page.value,
        |u| {
            vec![
                text_field(u, "displayName").to_string(),
                text_field(u, "userPrincipalName").to_string(),
                text_field(u, "id").to_string(),
            ]
        },
    );
    Ok(())
}

pub async fn devices(config: &AppConfig, args: ListArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let page = safe(
        || graph.get_managed_devices(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await;
    warn_limitations(&limitations);

    print_or_empty(
        "Managed Devices",
        &["Device Name", "Model", "OS", "Status"],
        &page.value,
        device_row,
    );
    Ok(())
}

pub async fn groups(config: &AppConfig, args: ListArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let page = safe(
        || graph.get_groups(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await;
    warn_limitations(&limitations);

    print_or_empty("Groups", &["Display Name", "Id"], &page.value, |g| {
        vec![
            text_field(g, "displayName").to_string(),
            text_field(g, "id").to_string(),
        ]
    });
    Ok(())
}

/// Device name, model, OS and management status
pub fn device_row(d: &Value) -> Vec<String> {
    ["deviceName", "model", "operatingSystem", "managedDeviceStatus"]
        .iter()
        .map(|key| text_field(d, key).to_string())
        .collect()
}
