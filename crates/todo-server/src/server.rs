use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use todo_service::TaskService;

use crate::config::ServerConfig;
use crate::handlers;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaskService>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let todo = Router::new()
        .route("/all", get(handlers::list_tasks))
        .route("/add", post(handlers::add_task))
        .route("/update", post(handlers::update_task))
        .route("/delete", post(handlers::delete_task))
        .route("/import", post(handlers::import_tasks))
        .route("/export", get(handlers::export_tasks));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/todo", todo)
        .with_state(state)
        .layer(cors_layer(&config.cors_origin))
}

/// Create and start the server. Returns a handle that keeps it alive.
pub async fn start(
    config: ServerConfig,
    service: Arc<TaskService>,
) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(AppState { service }, &config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "todo server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server,
    })
}

/// Handle returned by `start()` — keeps the serve task alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

/// CORS restricted to the one configured origin.
fn cors_layer(origin: &str) -> CorsLayer {
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS origin, falling back to permissive");
            CorsLayer::permissive()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use todo_store::tasks::TaskRow;
    use todo_store::Database;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let db = Database::in_memory().unwrap();
        let service = Arc::new(TaskService::new(db));
        build_router(AppState { service }, &ServerConfig::default())
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let router = test_router();
        let (status, body) = send(&router, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn add_returns_created_task() {
        let router = test_router();
        let (status, body) = send(&router, post_json("/todo/add", r#"{"name":"Buy milk"}"#)).await;
        assert_eq!(status, StatusCode::OK);

        let task: TaskRow = serde_json::from_slice(&body).unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.name, "Buy milk");
        assert!(!task.completed);
        assert!(!task.created_at.is_empty());

        // createdAt on the wire, not created_at
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("createdAt").is_some());
    }

    #[tokio::test]
    async fn add_blank_name_is_400_empty_body() {
        let router = test_router();
        let (status, body) = send(&router, post_json("/todo/add", r#"{"name":"   "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn add_missing_name_is_400() {
        let router = test_router();
        let (status, _) = send(&router, post_json("/todo/add", r#"{"completed":true}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_malformed_field_type_is_client_error() {
        let router = test_router();
        let (status, _) = send(&router, post_json("/todo/add", r#"{"name":42}"#)).await;
        assert!(status.is_client_error(), "got: {status}");
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let router = test_router();
        send(&router, post_json("/todo/add", r#"{"name":"Buy milk"}"#)).await;

        let (status, body) = send(
            &router,
            post_json("/todo/update", r#"{"id":1,"completed":true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let task: TaskRow = serde_json::from_slice(&body).unwrap();
        assert_eq!(task.name, "Buy milk");
        assert!(task.completed);

        let (_, body) = send(
            &router,
            post_json("/todo/update", r#"{"id":1,"name":"Buy bread"}"#),
        )
        .await;
        let task: TaskRow = serde_json::from_slice(&body).unwrap();
        assert_eq!(task.name, "Buy bread");
        assert!(task.completed);
    }

    #[tokio::test]
    async fn update_nonexistent_is_400_empty_body() {
        let router = test_router();
        let (status, body) = send(&router, post_json("/todo/update", r#"{"id":99}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn update_missing_id_is_400() {
        let router = test_router();
        let (status, _) = send(&router, post_json("/todo/update", r#"{"name":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_existing_returns_confirmation() {
        let router = test_router();
        send(&router, post_json("/todo/add", r#"{"name":"Buy milk"}"#)).await;

        let (status, body) = send(&router, post_json("/todo/delete", r#"{"id":1}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Task deleted successfully");

        let (_, body) = send(&router, get_req("/todo/all")).await;
        let tasks: Vec<TaskRow> = serde_json::from_slice(&body).unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_failure_message() {
        let router = test_router();
        let (status, body) = send(&router, post_json("/todo/delete", r#"{"id":99}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Failed to delete task");
    }

    #[tokio::test]
    async fn delete_missing_id_returns_validation_message() {
        let router = test_router();
        let (status, body) = send(&router, post_json("/todo/delete", r#"{}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Task ID cannot be null");
    }

    #[tokio::test]
    async fn import_regenerates_ids() {
        let router = test_router();
        let (status, body) = send(
            &router,
            post_json(
                "/todo/import",
                r#"[{"id":40,"name":"first"},{"id":41,"name":"second","completed":true}]"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Tasks imported successfully");

        let (_, body) = send(&router, get_req("/todo/all")).await;
        let tasks: Vec<TaskRow> = serde_json::from_slice(&body).unwrap();
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn import_empty_returns_validation_message() {
        let router = test_router();
        let (status, body) = send(&router, post_json("/todo/import", "[]")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"No tasks to import");
    }

    #[tokio::test]
    async fn import_bad_record_aborts_whole_import() {
        let router = test_router();
        let (status, _) = send(
            &router,
            post_json("/todo/import", r#"[{"name":"fine"},{"name":"   "}]"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&router, get_req("/todo/all")).await;
        let tasks: Vec<TaskRow> = serde_json::from_slice(&body).unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn export_matches_all() {
        let router = test_router();
        send(&router, post_json("/todo/add", r#"{"name":"one"}"#)).await;
        send(
            &router,
            post_json("/todo/add", r#"{"name":"two","completed":true}"#),
        )
        .await;

        let (all_status, all_body) = send(&router, get_req("/todo/all")).await;
        let (export_status, export_body) = send(&router, get_req("/todo/export")).await;
        assert_eq!(all_status, StatusCode::OK);
        assert_eq!(export_status, StatusCode::OK);
        assert_eq!(all_body, export_body);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let router = test_router();
        let req = Request::builder()
            .uri("/todo/all")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );
    }

    #[tokio::test]
    async fn server_starts_and_serves_requests() {
        let db = Database::in_memory().unwrap();
        let service = Arc::new(TaskService::new(db));
        let config = ServerConfig {
            port: 0, // Random port
            ..Default::default()
        };

        let handle = start(config, service).await.unwrap();
        assert!(handle.port > 0);

        let base = format!("http://127.0.0.1:{}", handle.port);
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/todo/add"))
            .json(&serde_json::json!({ "name": "Buy milk" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let task: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(task["name"], "Buy milk");

        let resp = reqwest::get(format!("{base}/todo/all")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let tasks: Vec<TaskRow> = resp.json().await.unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
