//! Snapshot builder against a mocked tenant

use ai_it::config::AppConfig;
use ai_it::graph::snapshot::DEFAULT_SNAPSHOT_TOP;
use ai_it::graph::{AreaStatus, GraphClient, Limitations};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVICES: &str = "/v1.0/deviceManagement/managedDevices";
const APPS: &str = "/v1.0/deviceAppManagement/mobileApps";
const CONFIGS: &str = "/v1.0/deviceManagement/deviceConfigurations";

async fn graph_for(server: &MockServer) -> GraphClient {
    Mock::given(method("POST"))
        .and(path("/tenant-123/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(server)
        .await;

    let config = AppConfig {
        azure_tenant_id: "tenant-123".into(),
        azure_client_id: "client-abc".into(),
        azure_client_secret: "secret".into(),
        graph_base_url: format!("{}/v1.0", server.uri()),
        authority_host: server.uri(),
        ..Default::default()
    };
    GraphClient::new(&config).unwrap()
}

async fn respond(server: &MockServer, endpoint: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(template)
        .mount(server)
        .await;
}

fn page(items: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": items }))
}

fn device(i: usize) -> Value {
    let (state, os) = match i % 4 {
        0 => ("compliant", "Windows"),
        1 => ("noncompliant", "Windows"),
        2 => ("noncompliant", "iOS"),
        _ => ("inGracePeriod", "Android"),
    };
    json!({"id": format!("dev-{}", i), "complianceState": state, "operatingSystem": os})
}

#[tokio::test]
async fn test_all_collections_failing_yields_no_snapshot() {
    let server = MockServer::start().await;
    let mut graph = graph_for(&server).await;

    respond(&server, DEVICES, ResponseTemplate::new(403)).await;
    respond(&server, APPS, ResponseTemplate::new(403)).await;
    respond(&server, CONFIGS, ResponseTemplate::new(500)).await;

    let mut limitations = Limitations::new();
    let snapshot = graph.build_snapshot(&mut limitations, 100).await;

    assert!(snapshot.is_none());
    assert_eq!(
        limitations.notes(),
        [
            "Permission-limited: request returned 403",
            "Permission-limited: request returned 403",
            "Error: HTTP 500",
        ]
    );
    assert!(graph.get_permission_status().is_empty());
}

#[tokio::test]
async fn test_failed_apps_leave_partial_snapshot() {
    let server = MockServer::start().await;
    let mut graph = graph_for(&server).await;

    respond(
        &server,
        DEVICES,
        page(vec![
            json!({"complianceState": "compliant", "operatingSystem": "Windows"}),
            json!({"complianceState": "noncompliant", "operatingSystem": "macOS"}),
        ]),
    )
    .await;
    respond(&server, APPS, ResponseTemplate::new(403)).await;
    respond(
        &server,
        CONFIGS,
        page(vec![json!({"id": "c1", "displayName": "BitLocker"})]),
    )
    .await;

    let mut limitations = Limitations::new();
    let snapshot = graph.build_snapshot(&mut limitations, 100).await.unwrap();

    assert_eq!(snapshot.total_devices, 2);
    assert_eq!(snapshot.app_count, 0);
    assert!(snapshot.app_type_breakdown.is_empty());
    assert_eq!(snapshot.config_policy_names, vec!["BitLocker".to_string()]);
    assert_eq!(limitations.len(), 1);
    assert!(limitations.any_forbidden());

    assert_eq!(
        graph.get_permission_status(),
        vec![
            ("Managed Devices".to_string(), AreaStatus::Available),
            ("Mobile Apps".to_string(), AreaStatus::Denied),
            ("Device Configurations".to_string(), AreaStatus::Available),
        ]
    );
}

#[tokio::test]
async fn test_empty_or_non_object_bodies_mark_area_denied() {
    let server = MockServer::start().await;
    let mut graph = graph_for(&server).await;

    respond(&server, DEVICES, page(Vec::new())).await;
    respond(&server, APPS, ResponseTemplate::new(200)).await;
    respond(&server, CONFIGS, ResponseTemplate::new(200).set_body_json(json!([1, 2]))).await;

    let mut limitations = Limitations::new();
    let snapshot = graph.build_snapshot(&mut limitations, 10).await.unwrap();

    assert_eq!(snapshot.total_devices, 0);
    assert_eq!(snapshot.app_count, 0);
    assert_eq!(snapshot.config_count, 0);
    assert!(limitations.is_empty());
    assert_eq!(
        graph.get_permission_status(),
        vec![
            ("Managed Devices".to_string(), AreaStatus::Available),
            ("Mobile Apps".to_string(), AreaStatus::Denied),
            ("Device Configurations".to_string(), AreaStatus::Denied),
        ]
    );
}

#[tokio::test]
async fn test_large_tenant_is_paginated_into_one_snapshot() {
    let server = MockServer::start().await;
    let mut graph = graph_for(&server).await;

    let devices: Vec<Value> = (0..3100).map(device).collect();
    let chunks: Vec<&[Value]> = vec![
        &devices[0..999],
        &devices[999..1998],
        &devices[1998..2997],
        &devices[2997..3100],
    ];

    for (i, chunk) in chunks.iter().enumerate() {
        let mut body = json!({ "value": chunk });
        if i + 1 < chunks.len() {
            body["@odata.nextLink"] =
                json!(format!("{}{}?$skiptoken=p{}", server.uri(), DEVICES, i + 2));
        }
        let mock = Mock::given(method("GET")).and(path(DEVICES));
        let mock = if i == 0 {
            mock.and(query_param("$top", "999"))
        } else {
            mock.and(query_param("$skiptoken", format!("p{}", i + 1)))
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    respond(
        &server,
        APPS,
        page(vec![
            json!({"@odata.type": "#microsoft.graph.win32LobApp", "displayName": "7-Zip"}),
            json!({"@odata.type": "#microsoft.graph.iosStoreApp", "displayName": "Teams"}),
        ]),
    )
    .await;
    respond(&server, CONFIGS, page(Vec::new())).await;

    let mut limitations = Limitations::new();
    let snapshot = graph
        .build_snapshot(&mut limitations, DEFAULT_SNAPSHOT_TOP)
        .await
        .unwrap();

    assert!(limitations.is_empty());
    assert_eq!(snapshot.total_devices, 3100);
    assert_eq!(snapshot.compliant, 775);
    assert_eq!(snapshot.non_compliant, 1550);
    assert_eq!(snapshot.unknown, 775);
    assert_eq!(snapshot.os_breakdown.get("Windows"), Some(&1550));
    assert_eq!(snapshot.top_non_compliant_os.len(), 2);
    assert_eq!(snapshot.top_non_compliant_os[0].os, "Windows");
    assert_eq!(snapshot.app_type_breakdown.get("win32LobApp"), Some(&1));
}
