//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p kyte-api`.

#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

use axum_test::TestServer;
use kyte_api::setup::routes;
use kyte_api::{AppState, SourceGuard};
use kyte_core::Config;
use kyte_processing::{InlinePlaceholderDeriver, PlaceholderDeriver};
use kyte_storage::ImageStore;
use std::collections::HashMap;
use std::sync::Arc;

use doubles::{FakeDeriver, FakeStore};

pub const TEST_ACCOUNT: &str = "acc";
pub const TEST_TOKEN: &str = "test-token";

/// Config with test credentials plus `overrides`.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("CLOUDFLARE_ACCOUNT".to_string(), TEST_ACCOUNT.to_string()),
        ("CLOUDFLARE_TOKEN".to_string(), TEST_TOKEN.to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key: &str| vars.get(key).cloned()).expect("test config should load")
}

/// Test application: server plus the doubles it was built with.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<FakeStore>,
    pub deriver: Arc<FakeDeriver>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn server_for(state: AppState) -> TestServer {
    let app = routes::build_router(Arc::new(state));
    TestServer::new(app.into_make_service()).expect("Failed to create test server")
}

/// App whose pipeline talks to in-memory doubles. The placeholder route
/// shares the same fake deriver.
pub fn setup_test_app(overrides: &[(&str, &str)], store: FakeStore, deriver: FakeDeriver) -> TestApp {
    let store = Arc::new(store);
    let deriver = Arc::new(deriver);
    let state = AppState::new(
        test_config(overrides),
        store.clone(),
        deriver.clone(),
        deriver.clone(),
    );
    TestApp {
        server: server_for(state),
        store,
        deriver,
    }
}

/// App with a real in-process placeholder generator behind the given guard.
pub fn setup_placeholder_app(overrides: &[(&str, &str)], guard: SourceGuard) -> TestServer {
    let config = test_config(overrides);
    let generator: Arc<dyn PlaceholderDeriver> = Arc::new(
        InlinePlaceholderDeriver::new(config.placeholder_width, config.max_file_size_bytes)
            .expect("generator should build"),
    );
    let store: Arc<dyn ImageStore> = Arc::new(FakeStore::default());
    let state = AppState::new(config, store, generator.clone(), generator).with_source_guard(guard);
    server_for(state)
}

/// App wired exactly like production, pointed at a fake provider API.
pub fn setup_app_against_provider(api_base: &str, overrides: &[(&str, &str)]) -> TestServer {
    let mut vars = vec![("CLOUDFLARE_API_BASE", api_base)];
    vars.extend_from_slice(overrides);
    let state = kyte_api::setup::build_state(test_config(&vars)).expect("state should build");
    server_for(state)
}
