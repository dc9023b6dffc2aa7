//! Known Graph endpoints and live permission probing
//!
//! The registry lists both the permissions the app registration holds today and
//! the ones planned for later phases, so `check-permissions` can show actual vs.
//! expected grants endpoint by endpoint.

use crate::error::{AiItError, GraphErrorKind};
use crate::graph::GraphClient;
use reqwest::Method;
use serde_json::{Value, json};
use std::fmt;

/// Longest error text shown in a probe note
const MAX_PROBE_ERROR_CHARS: usize = 50;

const TOP_ONE: &[(&str, &str)] = &[("$top", "1")];

/// One probeable Graph endpoint
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    /// Display label, e.g. "Managed Devices"
    pub area: &'static str,
    pub path: &'static str,
    pub method: Method,
    pub params: &'static [(&'static str, &'static str)],
    /// Body sent with POST probes
    pub json_body: Option<Value>,
    /// Whether the app registration is expected to hold this permission today
    pub currently_granted: bool,
}

impl EndpointDescriptor {
    fn get(area: &'static str, path: &'static str, currently_granted: bool) -> Self {
        Self {
            area,
            path,
            method: Method::GET,
            params: TOP_ONE,
            json_body: None,
            currently_granted,
        }
    }

    fn post(area: &'static str, path: &'static str, body: Value, currently_granted: bool) -> Self {
        Self {
            area,
            path,
            method: Method::POST,
            params: &[],
            json_body: Some(body),
            currently_granted,
        }
    }

    /// Last path segment, for compact tables
    pub fn short_path(&self) -> &str {
        self.path.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(self.path)
    }
}

/// The ordered endpoint registry. Order is the probe report order.
pub fn endpoint_registry() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::get("Managed Devices", "deviceManagement/managedDevices", true),
        EndpointDescriptor::get("Mobile Apps", "deviceAppManagement/mobileApps", true),
        EndpointDescriptor::get("Device Configurations", "deviceManagement/deviceConfigurations", true),
        EndpointDescriptor::get("Service Config", "deviceManagement/deviceEnrollmentConfigurations", true),
        EndpointDescriptor::post(
            "Reports",
            "deviceManagement/reports/getConfigurationPolicyNonComplianceSummaryReport",
            json!({}),
            true,
        ),
        EndpointDescriptor::get("Users", "users", false),
        EndpointDescriptor::get("Groups", "groups", false),
        EndpointDescriptor::get("Conditional Access", "identity/conditionalAccess/policies", false),
        EndpointDescriptor::get("Security Alerts", "security/alerts_v2", false),
        EndpointDescriptor::get("Licenses", "subscribedSkus", false),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Available,
    Denied,
    Error,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "Available",
            Self::Denied => "Denied",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Classify a failed probe.
///
/// A 404 means the endpoint is reachable but has nothing to return.
pub fn classify_failure(err: &AiItError, currently_granted: bool) -> (ProbeStatus, String) {
    match err.kind() {
        GraphErrorKind::Forbidden if currently_granted => {
            (ProbeStatus::Denied, "Not granted (403)".to_string())
        }
        GraphErrorKind::Forbidden => (ProbeStatus::Denied, "Future scope".to_string()),
        GraphErrorKind::NotFound => (ProbeStatus::Available, "No data".to_string()),
        GraphErrorKind::Other => (
            ProbeStatus::Error,
            format!("Error: {}", ellipsize(&err.to_string(), MAX_PROBE_ERROR_CHARS)),
        ),
    }
}

fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

impl GraphClient {
    /// Issue exactly one call for `descriptor` and classify the outcome
    pub async fn probe_endpoint(&self, descriptor: &EndpointDescriptor) -> (ProbeStatus, String) {
        let params = (!descriptor.params.is_empty()).then_some(descriptor.params);
        let body = if descriptor.method == Method::POST {
            descriptor.json_body.as_ref()
        } else {
            None
        };

        let result = self
            .request(descriptor.method.clone(), descriptor.path, params, body)
            .await;

        let outcome = match result {
            Ok(_) => (ProbeStatus::Available, "Granted".to_string()),
            Err(e) => classify_failure(&e, descriptor.currently_granted),
        };

        tracing::debug!(area = descriptor.area, status = %outcome.0, note = %outcome.1, "probed endpoint");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_shape() {
        let registry = endpoint_registry();
        let areas: Vec<_> = registry.iter().map(|d| d.area).collect();
        assert_eq!(
            areas,
            [
                "Managed Devices",
                "Mobile Apps",
                "Device Configurations",
                "Service Config",
                "Reports",
                "Users",
                "Groups",
                "Conditional Access",
                "Security Alerts",
                "Licenses",
            ]
        );
        assert_eq!(registry.iter().filter(|d| d.currently_granted).count(), 5);

        let reports = &registry[4];
        assert_eq!(reports.method, Method::POST);
        assert!(reports.params.is_empty());
        assert_eq!(reports.json_body, Some(json!({})));
    }

    #[test]
    fn test_forbidden_depends_on_expected_grant() {
        let err = AiItError::graph(Some(403), "Microsoft Graph request failed (HTTP 403).");
        assert_eq!(
            classify_failure(&err, true),
            (ProbeStatus::Denied, "Not granted (403)".to_string())
        );
        assert_eq!(
            classify_failure(&err, false),
            (ProbeStatus::Denied, "Future scope".to_string())
        );
    }

    #[test]
    fn test_not_found_is_available_without_data() {
        let err = AiItError::graph(Some(404), "Microsoft Graph request failed (HTTP 404).");
        assert_eq!(
            classify_failure(&err, true),
            (ProbeStatus::Available, "No data".to_string())
        );
    }

    #[test]
    fn test_other_errors_are_ellipsized() {
        let err = AiItError::graph(None, "Microsoft Graph request failed (network or timeout).");
        let (status, note) = classify_failure(&err, true);
        assert_eq!(status, ProbeStatus::Error);
        assert_eq!(note, "Error: Microsoft Graph request failed (network or time...");
        assert_eq!(note.trim_start_matches("Error: ").chars().count(), 50);

        let short = AiItError::graph(Some(500), "HTTP 500");
        assert_eq!(classify_failure(&short, false).1, "Error: HTTP 500");
    }

    #[test]
    fn test_short_path() {
        let registry = endpoint_registry();
        assert_eq!(registry[0].short_path(), "managedDevices");
        assert_eq!(registry[5].short_path(), "users");
    }
}
