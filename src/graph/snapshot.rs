//! Intune snapshot: one devices + apps + configurations pull reduced to the
//! aggregate the report commands hand to the model.

use crate::graph::intune::{CollectionRead, DEVICE_CONFIGURATIONS, MANAGED_DEVICES, MOBILE_APPS};
use crate::graph::{GraphClient, Limitations, safe};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default item ceiling per collection. Large enough that pagination, not
/// truncation, decides completeness for real tenants.
pub const DEFAULT_SNAPSHOT_TOP: usize = 10_000;

const TOP_NON_COMPLIANT_OS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsCount {
    pub os: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntuneSnapshot {
    pub total_devices: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub unknown: usize,
    pub os_breakdown: BTreeMap<String, usize>,
    pub top_non_compliant_os: Vec<OsCount>,
    pub config_count: usize,
    pub config_policy_names: Vec<String>,
    pub app_count: usize,
    pub app_type_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaStatus {
    Available,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compliance {
    Compliant,
    NonCompliant,
    Unknown,
}

fn compliance_of(device: &Value) -> Compliance {
    let state = device
        .get("complianceState")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_lowercase();

    match state.as_str() {
        "compliant" => Compliance::Compliant,
        "noncompliant" => Compliance::NonCompliant,
        _ => Compliance::Unknown,
    }
}

fn non_empty_str<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Reduce raw collections into a snapshot.
///
/// Every device lands in exactly one compliance bucket, so
/// `compliant + non_compliant + unknown == total_devices`.
pub fn reduce(devices: &[Value], apps: &[Value], configs: &[Value]) -> IntuneSnapshot {
    let mut snapshot = IntuneSnapshot {
        total_devices: devices.len(),
        config_count: configs.len(),
        app_count: apps.len(),
        ..Default::default()
    };

    // insertion order matters for tie-breaking below
    let mut non_compliant_by_os: Vec<(String, usize)> = Vec::new();

    for device in devices {
        let os = non_empty_str(device, "operatingSystem").unwrap_or("Unknown");
        *snapshot.os_breakdown.entry(os.to_string()).or_insert(0) += 1;

        match compliance_of(device) {
            Compliance::Compliant => snapshot.compliant += 1,
            Compliance::NonCompliant => {
                snapshot.non_compliant += 1;
                match non_compliant_by_os.iter_mut().find(|(name, _)| name == os) {
                    Some((_, count)) => *count += 1,
                    None => non_compliant_by_os.push((os.to_string(), 1)),
                }
            }
            Compliance::Unknown => snapshot.unknown += 1,
        }
    }

    non_compliant_by_os.sort_by(|a, b| b.1.cmp(&a.1));
    snapshot.top_non_compliant_os = non_compliant_by_os
        .into_iter()
        .take(TOP_NON_COMPLIANT_OS)
        .map(|(os, count)| OsCount { os, count })
        .collect();

    for app in apps {
        let app_type = non_empty_str(app, "@odata.type")
            .unwrap_or("unknown")
            .replace("#microsoft.graph.", "");
        *snapshot.app_type_breakdown.entry(app_type).or_insert(0) += 1;
    }

    snapshot.config_policy_names = configs
        .iter()
        .filter_map(|c| non_empty_str(c, "displayName"))
        .map(str::to_string)
        .collect();

    snapshot
}

/// An area is available only when its fetch succeeded and Graph sent back
/// a non-empty object.
fn status_of(fetched: &Option<CollectionRead>) -> AreaStatus {
    match fetched {
        Some(read) if read.has_content => AreaStatus::Available,
        _ => AreaStatus::Denied,
    }
}

impl GraphClient {
    /// Pull devices, apps and configurations and reduce them to a snapshot.
    ///
    /// Each fetch is wrapped by [`safe`], so failures only add limitation
    /// notes. Returns `None` when all three fetches failed. Otherwise the
    /// per-area availability seen by this call is kept for
    /// [`GraphClient::get_permission_status`].
    pub async fn build_snapshot(
        &mut self,
        limitations: &mut Limitations,
        top: usize,
    ) -> Option<IntuneSnapshot> {
        let this: &GraphClient = self;

        let devices = safe(
            || async move { this.read_collection(MANAGED_DEVICES, top).await.map(Some) },
            None,
            limitations,
        )
        .await;
        let apps = safe(
            || async move { this.read_collection(MOBILE_APPS, top).await.map(Some) },
            None,
            limitations,
        )
        .await;
        let configs = safe(
            || async move { this.read_collection(DEVICE_CONFIGURATIONS, top).await.map(Some) },
            None,
            limitations,
        )
        .await;

        if devices.is_none() && apps.is_none() && configs.is_none() {
            tracing::debug!("no Intune collection could be fetched");
            return None;
        }

        self.last_snapshot_status = vec![
            ("Managed Devices", status_of(&devices)),
            ("Mobile Apps", status_of(&apps)),
            ("Device Configurations", status_of(&configs)),
        ];

        let devices = devices.map(|read| read.page.value).unwrap_or_default();
        let apps = apps.map(|read| read.page.value).unwrap_or_default();
        let configs = configs.map(|read| read.page.value).unwrap_or_default();

        tracing::debug!(
            devices = devices.len(),
            apps = apps.len(),
            configs = configs.len(),
            "building Intune snapshot"
        );

        Some(reduce(&devices, &apps, &configs))
    }

    /// Per-area availability recorded by the last successful
    /// [`GraphClient::build_snapshot`] on this client; empty before that.
    /// An area whose fetch succeeded with an empty body reads as denied.
    pub fn get_permission_status(&self) -> Vec<(String, AreaStatus)> {
        self.last_snapshot_status
            .iter()
            .map(|(area, status)| (area.to_string(), *status))
            .collect()
    }
}
