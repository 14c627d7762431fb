use revrec::core::model::{AnalysisData, FormInput, User};
use revrec::gateway::Gateway;
use revrec::store::local::LocalStore;
use revrec::store::remote::RemoteStore;
use revrec::sync::{SyncOutcome, sync_local_to_remote};
use std::collections::HashMap;
use wiremock::matchers::{headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analysis(id: &str, user_id: &str, tenant_id: &str, periodo: &str) -> AnalysisData {
    let mut a = AnalysisData::new(
        user_id,
        FormInput {
            vbv: 100_000.0,
            valores_pagos_cliente: 4_000.0,
            vrl: 70_000.0,
            vrlj: 5_000.0,
            additional_values: HashMap::new(),
            periodo: periodo.to_string(),
            tenant_id: tenant_id.to_string(),
        },
    );
    a.id = id.to_string();
    a
}

/// Serializes an analysis the way the remote store returns it: snake_case
/// columns with camelCase JSON payloads inside.
fn remote_row(a: &AnalysisData) -> serde_json::Value {
    serde_json::json!({
        "id": a.id,
        "user_id": a.user_id,
        "tenant_id": a.tenant_id,
        "form_data": serde_json::to_value(&a.form_data).unwrap(),
        "calculated_data": serde_json::to_value(&a.calculated_data).unwrap(),
        "timestamp": a.timestamp,
    })
}

fn remote_gateway(server: &MockServer) -> Gateway {
    let remote = RemoteStore::new(&server.uri(), "anon-key", Some("user-token"));
    Gateway::new(Some(remote), LocalStore::in_memory())
}

#[test_log::test(tokio::test)]
async fn test_remote_round_trip() {
    let server = MockServer::start().await;
    let a = analysis("a1", "u1", "t1", "2026-07");

    Mock::given(method("POST"))
        .and(path("/rest/v1/analyses"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/analyses"))
        .and(query_param("tenant_id", "eq.t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([remote_row(&a)])),
        )
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    gateway.save_analysis(&a).await;

    let loaded = gateway.load_analyses("t1").await;
    assert!(loaded.contains(&a));
}

#[test_log::test(tokio::test)]
async fn test_remote_failure_falls_back_to_local_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/analyses"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/analyses"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let remote = RemoteStore::new(&server.uri(), "anon-key", None);
    let gateway = Gateway::new(Some(remote), LocalStore::open(dir.path()));

    let a = analysis("a1", "u1", "t1", "2026-07");
    gateway.save_analysis(&a).await;

    let loaded = gateway.load_analyses("t1").await;
    assert!(loaded.contains(&a));
    assert!(loaded.iter().all(|x| x.tenant_id == "t1"));
}

#[test_log::test(tokio::test)]
async fn test_successful_remote_write_mirrors_to_local_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/analyses"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    let a = analysis("a1", "u1", "t1", "2026-07");
    gateway.save_analysis(&a).await;

    // The local mirror holds the record even though the remote write won.
    assert_eq!(gateway.local().analyses("t1"), vec![a]);
}

#[test_log::test(tokio::test)]
async fn test_current_user_maps_remote_profile_and_caches_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "u1", "email": "ana@example.com"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "u1",
            "email": "ana@example.com",
            "name": "Ana",
            "tenant_id": "t1",
            "role": "operator",
            "created_at": "2026-01-01T00:00:00Z"
        }])))
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    let user = gateway.current_user().await.expect("user should resolve");
    assert_eq!(user.tenant_id, "t1");
    assert_eq!(user.name, "Ana");

    // Mirrored into the local cache for offline runs.
    assert_eq!(gateway.local().cached_user(), Some(user));
}

#[test_log::test(tokio::test)]
async fn test_current_user_falls_back_to_cached_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    let cached = User {
        id: "u1".to_string(),
        email: "ana@example.com".to_string(),
        name: "Ana".to_string(),
        tenant_id: "t1".to_string(),
        role: "operator".to_string(),
        created_at: "2026-01-01T00:00:00Z".to_string(),
    };
    gateway.local().put_user(&cached);

    assert_eq!(gateway.current_user().await, Some(cached));
}

#[test_log::test(tokio::test)]
async fn test_logout_clears_cache_even_when_remote_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    gateway.local().put_user(&User {
        id: "u1".to_string(),
        email: "a@b.c".to_string(),
        name: "Ana".to_string(),
        tenant_id: "t1".to_string(),
        role: "operator".to_string(),
        created_at: "2026-01-01T00:00:00Z".to_string(),
    });

    gateway.logout().await;
    assert!(gateway.local().cached_user().is_none());
}

#[test_log::test(tokio::test)]
async fn test_delete_is_idempotent_over_remote_tier() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/analyses"))
        .and(query_param("id", "eq.a1"))
        .and(query_param("tenant_id", "eq.t1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    gateway.local().append_analysis(&analysis("a1", "u1", "t1", "2026-07"));

    gateway.delete_analysis("a1", "t1").await;
    let after_once = gateway.local().analyses("t1");
    gateway.delete_analysis("a1", "t1").await;
    let after_twice = gateway.local().analyses("t1");

    assert_eq!(after_once, after_twice);
    assert!(after_twice.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_by_user_falls_back_to_local_scan() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/analyses"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    gateway.local().append_analysis(&analysis("a1", "u1", "t1", "2026-07"));
    gateway.local().append_analysis(&analysis("a2", "u2", "t1", "2026-07"));

    let list = gateway.analyses_by_user("u1", "t1").await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "a1");
}

#[test_log::test(tokio::test)]
async fn test_sync_is_idempotent_via_conflict_key() {
    let server = MockServer::start().await;
    // Both runs hit the same upsert endpoint with the id conflict target;
    // the store deduplicates on the server side.
    Mock::given(method("POST"))
        .and(path("/rest/v1/analyses"))
        .and(query_param("on_conflict", "id"))
        .and(headers("Prefer", vec!["resolution=merge-duplicates", "return=minimal"]))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = remote_gateway(&server);
    gateway.local().append_analysis(&analysis("a1", "u1", "t1", "2026-07"));
    gateway.local().append_analysis(&analysis("a2", "u1", "t1", "2026-07"));

    let first = sync_local_to_remote(&gateway, "t1").await.unwrap();
    let second = sync_local_to_remote(&gateway, "t1").await.unwrap();
    assert_eq!(first, SyncOutcome::Synced(2));
    assert_eq!(second, SyncOutcome::Synced(2));

    // Local copies are retained after sync.
    assert_eq!(gateway.local().analyses("t1").len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_sync_with_empty_local_cache_is_a_noop() {
    let server = MockServer::start().await;
    let gateway = remote_gateway(&server);

    let outcome = sync_local_to_remote(&gateway, "t1").await.unwrap();
    assert_eq!(outcome, SyncOutcome::NothingToSync);
    assert!(server.received_requests().await.unwrap().is_empty());
}
