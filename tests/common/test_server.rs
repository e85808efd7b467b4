use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use foolscap::auth::TokenGenerator;
use foolscap::engine::{Engine, EnginePolicy};
use foolscap::server::{AppState, create_router};
use foolscap::store::{SqliteStore, Store};
use foolscap::types::Token;

/// In-process server on an ephemeral port. The admin token is created
/// directly in the store, the same way `admin init` does it.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_policy(EnginePolicy::default()).await
    }

    pub async fn start_with_policy(policy: EnginePolicy) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("foolscap.db")).expect("open store"),
        );
        store.initialize().expect("initialize schema");

        let generator = TokenGenerator::new();
        let (admin_token, lookup, hash) = generator.generate().expect("generate token");
        store
            .create_token(&Token {
                id: Uuid::new_v4().to_string(),
                token_hash: hash,
                token_lookup: lookup,
                is_admin: true,
                user_id: None,
                created_at: Utc::now(),
                expires_at: None,
                last_used_at: None,
            })
            .expect("create admin token");

        let engine = Engine::new(store.clone(), policy);
        let state = Arc::new(AppState { store, engine });
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://{addr}"),
            admin_token,
        }
    }
}
