use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use todo_server::ServerConfig;
use todo_service::TaskService;
use todo_store::Database;
use todo_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Debug, Parser)]
#[command(name = "todod", about = "Task-list web service")]
struct Args {
    /// Host to bind.
    #[arg(long, env = "TODO_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(long, env = "TODO_PORT", default_value_t = 8080)]
    port: u16,

    /// Path to the SQLite database file.
    #[arg(long, env = "TODO_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Origin allowed for cross-origin requests.
    #[arg(long, env = "TODO_CORS_ORIGIN", default_value = "http://localhost:5173")]
    cors_origin: String,

    /// Emit logs as JSON.
    #[arg(long, env = "TODO_JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_telemetry(TelemetryConfig {
        json: args.json_logs,
        ..Default::default()
    });

    tracing::info!("starting todod");

    let db_path = args.db_path.unwrap_or_else(default_db_path);
    let db = Database::open(&db_path).expect("failed to open database");
    let service = Arc::new(TaskService::new(db));

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        cors_origin: args.cors_origin,
    };
    let _handle = todo_server::start(config, service)
        .await
        .expect("failed to start server");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");

    tracing::info!("shutting down");
}

fn default_db_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".todod")
        .join("todo.db")
}
