//! Graph pull + model summary commands: `analyze-user`, `analyze-device`,
//! `audit-intune`, `list-apps`, `list-configs`

use crate::cmd::graph::device_row;
use crate::cmd::render::{print_panel, print_table, text_field, truncate};
use crate::cmd::{PERMISSION_MSG, ask_llm, warn_limitations};
use crate::config::AppConfig;
use crate::error::{AiItError, Result};
use crate::graph::snapshot::DEFAULT_SNAPSHOT_TOP;
use crate::graph::{GraphClient, Limitations, PaginatedResponse, safe};
use clap::Args;
use colored::Color;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Items passed to the model per collection
const PAYLOAD_SAMPLE: usize = 50;
/// Rows printed per table
const TABLE_ROWS: usize = 20;
const USER_DEVICE_SAMPLE: usize = 20;
const USER_DEVICE_ROWS: usize = 10;

const DEVICE_DETAIL_KEYS: [&str; 6] = [
    "deviceName",
    "model",
    "operatingSystem",
    "managedDeviceStatus",
    "complianceState",
    "deviceEnrollmentType",
];

#[derive(Args, Debug)]
pub struct AnalyzeUserArgs {
    /// User principal name, display name, or object id
    pub user: String,

    /// Max users and devices to fetch for the lookup
    #[arg(long, default_value = "100")]
    pub top: usize,
}

#[derive(Args, Debug)]
pub struct AnalyzeDeviceArgs {
    /// Intune managed device id
    pub device_id: String,
}

#[derive(Args, Debug)]
pub struct TopArgs {
    /// Max items to fetch per collection
    #[arg(long, default_value = "100")]
    pub top: usize,
}

fn matches_query(item: &Value, query: &str, name_keys: &[&str]) -> bool {
    let needle = query.to_lowercase();
    name_keys
        .iter()
        .any(|key| text_field(item, key).to_lowercase().contains(&needle))
        || text_field(item, "id") == query
}

/// First user whose UPN or display name contains `query`, or whose id equals it
pub fn find_user<'a>(users: &'a [Value], query: &str) -> Option<&'a Value> {
    users
        .iter()
        .find(|u| matches_query(u, query, &["userPrincipalName", "displayName"]))
}

/// Managed devices owned by the user `query` names
pub fn devices_for_user<'a>(devices: &'a [Value], query: &str) -> Vec<&'a Value> {
    devices
        .iter()
        .filter(|d| matches_query(d, query, &["userPrincipalName", "userDisplayName"]))
        .collect()
}

/// Count items by a string field, with `fallback` for missing or empty values
pub fn count_by(items: &[Value], key: &str, fallback: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        let value = match text_field(item, key) {
            "" => fallback,
            v => v,
        };
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

fn short_type(item: &Value) -> String {
    text_field(item, "@odata.type").replace("#microsoft.graph.", "")
}

/// Attach the limitation list, plus the warning text when non-empty
fn with_limitations(mut payload: Map<String, Value>, limitations: &Limitations) -> Value {
    payload.insert("limitations".into(), json!(limitations));
    if !limitations.is_empty() {
        payload.insert("limitation_note".into(), json!(PERMISSION_MSG));
    }
    Value::Object(payload)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

async fn summarize(config: &AppConfig, prompt_name: &str, payload: &Value) -> Result<String> {
    let text = serde_json::to_string_pretty(payload)?;
    ask_llm(config, prompt_name, &text).await
}

pub async fn analyze_user(config: &AppConfig, args: AnalyzeUserArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let users = safe(
        || graph.get_users(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await;
    let user_info = if limitations.is_empty() {
        find_user(&users.value, &args.user).cloned()
    } else {
        None
    };

    let devices = safe(
        || graph.get_managed_devices(args.top.min(DEFAULT_SNAPSHOT_TOP)),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await;
    let matching = devices_for_user(&devices.value, &args.user);

    let payload = with_limitations(
        object(json!({
            "query_user": args.user,
            "user_info": user_info,
            "managed_devices_count": matching.len(),
            "managed_devices": matching.iter().take(USER_DEVICE_SAMPLE).collect::<Vec<_>>(),
        })),
        &limitations,
    );

    let summary = summarize(config, "analyze_user", &payload).await?;

    if !matching.is_empty() {
        let rows: Vec<Vec<String>> = matching
            .iter()
            .take(USER_DEVICE_ROWS)
            .map(|d| device_row(d))
            .collect();
        print_table(
            "Managed devices for user",
            &["Device Name", "Model", "OS", "Status"],
            &rows,
        );
    }
    warn_limitations(&limitations);
    print_panel("AI summary", &summary, Color::Blue);

    Ok(())
}

pub async fn analyze_device(config: &AppConfig, args: AnalyzeDeviceArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let this = &graph;
    let device_id = args.device_id.as_str();
    let device = safe(
        || async move { this.get_managed_device(device_id).await.map(Some) },
        None,
        &mut limitations,
    )
    .await;

    let Some(device) = device else {
        let message = if limitations.any_forbidden() {
            PERMISSION_MSG
        } else {
            "Device not found or inaccessible."
        };
        return Err(AiItError::Unavailable(message.into()));
    };

    let summary = summarize(config, "analyze_device", &device).await?;

    let rows: Vec<Vec<String>> = DEVICE_DETAIL_KEYS
        .iter()
        .filter_map(|key| match device.get(*key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(vec![key.to_string(), s.clone()]),
            Some(other) => Some(vec![key.to_string(), other.to_string()]),
        })
        .collect();
    print_table("Device details", &["Property", "Value"], &rows);
    print_panel("AI summary", &summary, Color::Blue);

    Ok(())
}

pub async fn audit_intune(config: &AppConfig, args: TopArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let devices = safe(
        || graph.get_managed_devices(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await
    .value;
    let apps = safe(
        || graph.get_mobile_apps(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await
    .value;
    let configs = safe(
        || graph.get_device_configurations(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await
    .value;

    let app_sample: Vec<Value> = apps
        .iter()
        .take(PAYLOAD_SAMPLE)
        .map(|a| json!({"displayName": a.get("displayName"), "@odata.type": a.get("@odata.type")}))
        .collect();
    let config_sample: Vec<Value> = configs
        .iter()
        .take(PAYLOAD_SAMPLE)
        .map(|c| json!({"displayName": c.get("displayName"), "id": c.get("id")}))
        .collect();

    let payload = with_limitations(
        object(json!({
            "managed_devices_count": devices.len(),
            "mobile_apps_count": apps.len(),
            "device_configurations_count": configs.len(),
            "devices_by_os": count_by(&devices, "operatingSystem", "Unknown"),
            "devices_by_compliance": count_by(&devices, "complianceState", "unknown"),
            "mobile_apps_sample": app_sample,
            "device_configurations_sample": config_sample,
        })),
        &limitations,
    );

    let summary = summarize(config, "audit_intune", &payload).await?;

    let rows = vec![
        vec!["Managed devices".to_string(), devices.len().to_string()],
        vec!["Mobile apps".to_string(), apps.len().to_string()],
        vec!["Device configurations".to_string(), configs.len().to_string()],
    ];
    print_table("Intune audit counts", &["Resource", "Count"], &rows);
    warn_limitations(&limitations);
    print_panel("AI audit summary", &summary, Color::Blue);

    Ok(())
}

pub async fn list_apps(config: &AppConfig, args: TopArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let apps = safe(
        || graph.get_mobile_apps(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await
    .value;

    let payload = with_limitations(
        object(json!({
            "mobile_apps_count": apps.len(),
            "mobile_apps": apps.iter().take(PAYLOAD_SAMPLE).collect::<Vec<_>>(),
        })),
        &limitations,
    );

    let summary = summarize(config, "list_apps", &payload).await?;

    let rows: Vec<Vec<String>> = apps
        .iter()
        .take(TABLE_ROWS)
        .map(|a| vec![text_field(a, "displayName").to_string(), short_type(a)])
        .collect();
    print_table("Mobile apps", &["Display Name", "Type"], &rows);
    warn_limitations(&limitations);
    print_panel("AI summary", &summary, Color::Blue);

    Ok(())
}

pub async fn list_configs(config: &AppConfig, args: TopArgs) -> Result<()> {
    let graph = GraphClient::new(config)?;
    let mut limitations = Limitations::new();

    let configs = safe(
        || graph.get_device_configurations(args.top),
        PaginatedResponse::default(),
        &mut limitations,
    )
    .await
    .value;

    let payload = with_limitations(
        object(json!({
            "device_configurations_count": configs.len(),
            "device_configurations": configs.iter().take(PAYLOAD_SAMPLE).collect::<Vec<_>>(),
        })),
        &limitations,
    );

    let summary = summarize(config, "list_configs", &payload).await?;

    let rows: Vec<Vec<String>> = configs
        .iter()
        .take(TABLE_ROWS)
        .map(|c| {
            vec![
                text_field(c, "displayName").to_string(),
                truncate(text_field(c, "id"), 36),
            ]
        })
        .collect();
    print_table("Device configurations", &["Display Name", "Id"], &rows);
    warn_limitations(&limitations);
    print_panel("AI summary", &summary, Color::Blue);

    Ok(())
}
