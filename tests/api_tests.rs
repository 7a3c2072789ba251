//! End-to-end tests for the HTTP surface
//!
//! Each test serves the full router on an ephemeral port, backed by the
//! in-memory table store, and drives it with reqwest.

use serde_json::{json, Value};
use std::sync::Arc;
use taskvault::{
    api::AppState,
    auth::CallerFlagVerifier,
    config::Config,
    create_app,
    store::{tables, MemoryTableStore, TableStore, UnconfiguredStore},
};
use tokio::net::TcpListener;

// ============================================================================
// Test server
// ============================================================================

struct TestServer {
    base: String,
    client: reqwest::Client,
    state: AppState,
}

impl TestServer {
    async fn start(config: Config, store: Arc<dyn TableStore>) -> Self {
        let state = AppState::new(&config, store, Arc::new(CallerFlagVerifier));
        let app = create_app(&config, state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            state,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }
}

fn relaxed_config() -> Config {
    let mut config = Config::in_memory();
    config.rate_limit.read_per_window = 1_000;
    config.rate_limit.write_per_window = 1_000;
    config
}

async fn memory_server(config: Config) -> (TestServer, Arc<MemoryTableStore>) {
    let store = Arc::new(MemoryTableStore::new());
    let server = TestServer::start(config, store.clone()).await;
    (server, store)
}

// ============================================================================
// Workflows
// ============================================================================

#[tokio::test]
async fn workflow_lifecycle() {
    let (server, store) = memory_server(relaxed_config()).await;

    let (status, first) = server
        .send(
            reqwest::Method::POST,
            "/workflows",
            Some(json!({
                "title": "Onboard client",
                "steps": [{ "title": "Kickoff call", "assigned_to": "ana" }]
            })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(first["id"], 1);
    assert_eq!(first["steps"][0]["status"], "pending");
    assert_eq!(first["deleted_at"], Value::Null);

    let (_, second) = server
        .send(reqwest::Method::POST, "/workflows", Some(json!({ "title": "Audit prep" })))
        .await;
    assert_eq!(second["id"], 2);

    let (status, updated) = server
        .send(
            reqwest::Method::PATCH,
            "/workflows/1/steps/0",
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["steps"][0]["status"], "completed");
    assert_eq!(updated["steps"][0]["title"], "Kickoff call");
    assert_eq!(updated["steps"][0]["assigned_to"], "ana");
    assert_eq!(updated["title"], "Onboard client");

    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            "/workflows/1/steps/5",
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["detail"], "Step not found");

    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            "/workflows/1/steps/-1",
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["detail"], "Step not found");

    let (status, body) = server
        .send(reqwest::Method::PATCH, "/workflows/99/steps/0", Some(json!({})))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["detail"], "Workflow not found");

    let (status, deleted) = server.send(reqwest::Method::DELETE, "/workflows/1", None).await;
    assert_eq!(status, 200);
    assert!(deleted["deleted_at"].is_string());

    let (status, again) = server.send(reqwest::Method::DELETE, "/workflows/1", None).await;
    assert_eq!(status, 200);
    assert_eq!(again["deleted_at"], deleted["deleted_at"]);

    let (_, active) = server.get("/workflows").await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    let (_, trash) = server.get("/workflows/deleted").await;
    assert_eq!(trash[0]["id"], 1);

    let (status, restored) = server
        .send(reqwest::Method::POST, "/workflows/1/restore", None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(restored["deleted_at"], Value::Null);
    let (_, active) = server.get("/workflows").await;
    assert_eq!(active.as_array().unwrap().len(), 2);

    let (status, _) = server.send(reqwest::Method::DELETE, "/workflows/42", None).await;
    assert_eq!(status, 404);

    server.state.events.flush().await;
    let audit = store.rows(tables::AUDIT_LOGS).await;
    let deletions = audit
        .iter()
        .filter(|row| row["action"] == "workflow.deleted")
        .count();
    assert_eq!(deletions, 1);
}

#[tokio::test]
async fn malformed_requests_answer_with_detail_json() {
    let (server, _) = memory_server(relaxed_config()).await;
    server
        .send(
            reqwest::Method::POST,
            "/workflows",
            Some(json!({ "title": "Intake", "steps": [{ "title": "Call", "assigned_to": "ana" }] })),
        )
        .await;

    let response = server
        .client
        .patch(server.url("/workflows/1/steps/0"))
        .header("content-type", "application/json")
        .body("{bad")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());

    let (status, body) = server.get("/workflows/abc").await;
    assert_eq!(status, 400);
    assert!(body["detail"].is_string());

    let (status, body) = server.get("/audit-logs?actor_role=admin&limit=lots").await;
    assert_eq!(status, 400);
    assert!(body["detail"].is_string());

    let (status, body) = server
        .send(
            reqwest::Method::POST,
            "/team/add",
            Some(json!({ "email": "a@x.test", "role": "owner" })),
        )
        .await;
    assert_eq!(status, 400);
    assert!(body["detail"].is_string());
}

// ============================================================================
// Team
// ============================================================================

#[tokio::test]
async fn team_membership_rules() {
    let (server, _) = memory_server(relaxed_config()).await;

    for email in ["a@x.test", "b@x.test"] {
        let (status, _) = server
            .send(
                reqwest::Method::POST,
                "/team/add",
                Some(json!({ "email": email, "role": "member", "plan": "free" })),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (status, body) = server
        .send(
            reqwest::Method::POST,
            "/team/add",
            Some(json!({ "email": "c@x.test", "role": "member", "plan": "free" })),
        )
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["detail"], "Free plan is limited to 2 team members.");

    let (status, _) = server
        .send(
            reqwest::Method::POST,
            "/team/add",
            Some(json!({ "email": "A@X.TEST", "role": "admin", "plan": "pro" })),
        )
        .await;
    assert_eq!(status, 409);

    let (_, members) = server.get("/team").await;
    let first_id = members[0]["id"].as_i64().unwrap();

    let (status, _) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/team/{}/role", first_id),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, 403);

    let (status, _) = server
        .send(reqwest::Method::DELETE, &format!("/team/{}?actor_role=member", first_id), None)
        .await;
    assert_eq!(status, 403);

    let (status, promoted) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/team/{}/role?actor_role=admin", first_id),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(promoted["role"], "admin");

    let (status, removed) = server
        .send(reqwest::Method::DELETE, &format!("/team/{}?actor_role=admin", first_id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(removed["member"]["email"], "a@x.test");

    let (status, _) = server
        .send(reqwest::Method::DELETE, &format!("/team/{}?actor_role=admin", first_id), None)
        .await;
    assert_eq!(status, 404);

    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            "/team/1/role?actor_role=owner",
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, 400);
    assert!(body["detail"].as_str().unwrap().contains("Unknown role"));
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn write_ceiling_returns_429_and_health_is_exempt() {
    let mut config = Config::in_memory();
    config.rate_limit.write_per_window = 2;
    let (server, store) = memory_server(config).await;

    for _ in 0..2 {
        let (status, _) = server
            .send(reqwest::Method::POST, "/workflows?actor_id=u1", Some(json!({ "title": "t" })))
            .await;
        assert_eq!(status, 200);
    }
    let (status, body) = server
        .send(reqwest::Method::POST, "/workflows?actor_id=u1", Some(json!({ "title": "t" })))
        .await;
    assert_eq!(status, 429);
    assert!(body["detail"].as_str().unwrap().contains("POST /workflows"));

    let (status, _) = server
        .send(reqwest::Method::POST, "/workflows?actor_id=u2", Some(json!({ "title": "t" })))
        .await;
    assert_eq!(status, 200);

    for _ in 0..5 {
        let (status, _) = server.get("/health").await;
        assert_eq!(status, 200);
    }

    let (_, workflows) = server.get("/workflows").await;
    assert_eq!(workflows.as_array().unwrap().len(), 3);

    let windows = store.rows(tables::RATE_LIMITS).await;
    assert!(windows.iter().all(|w| w["endpoint"] != "GET /health"));
}

#[tokio::test]
async fn rate_limiter_fails_open_when_store_is_down() {
    let mut config = Config::in_memory();
    config.rate_limit.write_per_window = 1;
    let (server, store) = memory_server(config).await;
    store.set_unavailable(true);

    for _ in 0..3 {
        let (status, _) = server
            .send(reqwest::Method::POST, "/workflows", Some(json!({ "title": "t" })))
            .await;
        assert_eq!(status, 200);
    }
}

// ============================================================================
// Audit, analytics, health
// ============================================================================

#[tokio::test]
async fn audit_feed_is_admin_only_and_newest_first() {
    let (server, _) = memory_server(relaxed_config()).await;

    server
        .send(reqwest::Method::POST, "/workflows?actor_id=u1", Some(json!({ "title": "one" })))
        .await;
    server
        .send(
            reqwest::Method::POST,
            "/team/add?actor_id=u1",
            Some(json!({ "email": "a@x.test", "role": "member", "plan": "pro" })),
        )
        .await;
    server.state.events.flush().await;

    let (status, _) = server.get("/audit-logs").await;
    assert_eq!(status, 403);

    let (status, logs) = server.get("/audit-logs?actor_role=admin&limit=50").await;
    assert_eq!(status, 200);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action"], "team.member_added");
    assert_eq!(logs[0]["actor_id"], "u1");
    assert_eq!(logs[1]["action"], "workflow.created");
}

#[tokio::test]
async fn analytics_overview_counts_active_work() {
    let (server, _) = memory_server(relaxed_config()).await;

    server
        .send(
            reqwest::Method::POST,
            "/workflows",
            Some(json!({
                "title": "Release",
                "steps": [
                    { "title": "Build", "assigned_to": "a", "status": "completed" },
                    { "title": "Ship", "assigned_to": "b", "status": "in_progress" }
                ]
            })),
        )
        .await;
    server
        .send(reqwest::Method::POST, "/workflows", Some(json!({ "title": "Gone" })))
        .await;
    server.send(reqwest::Method::DELETE, "/workflows/2", None).await;
    server
        .send(
            reqwest::Method::POST,
            "/team/add",
            Some(json!({ "email": "boss@x.test", "role": "admin", "plan": "free" })),
        )
        .await;

    let (status, overview) = server.get("/analytics/overview").await;
    assert_eq!(status, 200);
    assert_eq!(
        overview,
        json!({
            "workflows": {
                "total": 1,
                "with_steps": 1,
                "without_steps": 0,
                "total_steps": 2,
                "pending_steps": 0,
                "in_progress_steps": 1,
                "completed_steps": 1
            },
            "team": { "total_members": 1, "admins": 1, "members": 0 }
        })
    );
}

#[tokio::test]
async fn health_reports_store_state() {
    let (server, store) = memory_server(relaxed_config()).await;

    let (status, health) = server.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["backend"]["ok"], true);
    assert_eq!(health["store"]["ok"], true);
    assert!(health["store"]["latency_ms"].is_u64());

    store.set_unavailable(true);
    let (status, health) = server.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["store"]["ok"], false);
}

#[tokio::test]
async fn unconfigured_store_keeps_workflows_available() {
    let store = Arc::new(UnconfiguredStore::new("SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY not set"));
    let server = TestServer::start(relaxed_config(), store).await;

    let (status, _) = server
        .send(reqwest::Method::POST, "/workflows", Some(json!({ "title": "still works" })))
        .await;
    assert_eq!(status, 200);

    let (status, body) = server.get("/team").await;
    assert_eq!(status, 500);
    assert!(body["detail"].as_str().unwrap().contains("not configured"));

    let (_, health) = server.get("/health").await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["store"]["detail"],
        "SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY not set"
    );
}
