//! Test database setup and management
#![allow(dead_code)]

use complaint_desk::app_config::AppConfig;
use complaint_desk::db::Store;
use complaint_desk::session::TokenKeys;
use complaint_desk::web::AppState;
use sea_orm::DatabaseConnection;
use tempfile::NamedTempFile;

pub const TEST_TOKEN_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// A throwaway SQLite database with the schema already created. The file is
/// removed when the value is dropped.
pub struct TestDb {
    store: Store,
    _temp_file: NamedTempFile,
}

impl TestDb {
    pub async fn new() -> Self {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_str().expect("Invalid temp file path");
        let db_url = format!("sqlite://{}?mode=rwc", db_path);

        let store = Store::connect(&db_url)
            .await
            .expect("Failed to connect to test database");
        store
            .ensure_schema()
            .await
            .expect("Failed to create schema");

        Self {
            store,
            _temp_file: temp_file,
        }
    }

    pub fn store(&self) -> Store {
        self.store.clone()
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.store.conn()
    }

    pub fn keys(&self) -> TokenKeys {
        TokenKeys::new(TEST_TOKEN_SECRET, 1).expect("Failed to build token keys")
    }

    /// Services wired exactly as the server wires them.
    pub fn state(&self, config: &AppConfig) -> AppState {
        AppState::new(self.store(), self.keys(), config)
    }
}
