use axum::Router;
use menu_relay::{
    config::{BackendConfig, Config, LogsConfig, ServerConfig},
    inference::{InferenceBackend, MenuItem},
    server::{self, handlers::AppState},
    store::MenuStore,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: ":memory:".to_string(),
            logs: LogsConfig {
                level: "debug".to_string(),
            },
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_upload_bytes: 1024 * 1024,
        },
        backend: BackendConfig {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        },
    }
}

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test config YAML file
pub async fn create_test_config_file(dir: &TempDir, content: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, content)
        .await
        .expect("Failed to write config file");
    config_path.to_string_lossy().to_string()
}

/// Build the full router around the given backend and a fresh in-memory store
pub async fn create_test_app(backend: impl InferenceBackend + 'static) -> (Router, Arc<MenuStore>) {
    let config = create_test_config();
    let store = Arc::new(MenuStore::new(":memory:").await.unwrap());
    let state = AppState {
        backend: Arc::new(backend),
        store: store.clone(),
    };
    (server::router(state, &config.server), store)
}

pub fn menu_item(name: &str, price: &str) -> MenuItem {
    MenuItem {
        name: name.to_string(),
        price: price.to_string(),
        description: None,
        category: None,
    }
}

/// Minimal config that only sets the required fields
pub const MINIMAL_CONFIG_YAML: &str = r#"
server: {}
backend:
  base_url: "http://localhost:8000"
"#;

/// Config with every field set
pub const FULL_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9090
  database_path: "/tmp/menu-test.db"
  allowed_origins:
    - "https://lunch.example.com"
  max_upload_bytes: 2048
  logs:
    level: "warn"

backend:
  base_url: "https://inference.example.com/"
  timeout_secs: 5
"#;

pub const INVALID_BACKEND_URL_YAML: &str = r#"
server: {}
backend:
  base_url: "inference-backend"
"#;

pub const ZERO_TIMEOUT_YAML: &str = r#"
server: {}
backend:
  base_url: "http://localhost:8000"
  timeout_secs: 0
"#;
