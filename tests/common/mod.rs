#![allow(dead_code)]

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use torum_client::auth::{MemoryStorage, SessionStorage};
use torum_client::config::ClientOptions;
use torum_client::guard::Navigator;
use torum_client::Torum;

/// Navigator that remembers every route it was asked to open
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

pub struct Harness {
    pub torum: Torum,
    pub storage: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn harness(base_url: &str) -> Harness {
    harness_with_storage(base_url, Arc::new(MemoryStorage::new()))
}

pub fn harness_with_storage(base_url: &str, storage: Arc<MemoryStorage>) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let torum = Torum::with_storage(
        ClientOptions::default().with_base_url(base_url),
        storage.clone(),
        navigator.clone(),
    )
    .unwrap();
    Harness {
        torum,
        storage,
        navigator,
    }
}

/// A signed access token for `sub` expiring `offset_secs` from now
pub fn access_token(sub: &str, offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + offset_secs;
    encode(
        &Header::default(),
        &json!({ "sub": sub, "exp": exp }),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

pub fn user_json(role: &str) -> Value {
    json!({
        "user_id": "5f0c8a2e-1b7e-4c59-9d0a-2f4b1c3d4e5f",
        "username": "alice",
        "email": "alice@example.com",
        "user_role": role
    })
}

/// Put a session straight into storage, as a previous run would have left it
pub fn seed_session(storage: &MemoryStorage, access: &str, refresh: &str, role: &str) {
    storage.set_item("access_token", access).unwrap();
    storage.set_item("refresh_token", refresh).unwrap();
    storage
        .set_item("user", &user_json(role).to_string())
        .unwrap();
}

pub fn post_json(id: &str, title: &str) -> Value {
    json!({
        "post_id": id,
        "post_owner": "5f0c8a2e-1b7e-4c59-9d0a-2f4b1c3d4e5f",
        "post_title": title,
        "post_content": "Watching the 200-day moving average.",
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00"
    })
}

pub fn document_json(id: &str, title: &str) -> Value {
    json!({
        "docs_id": id,
        "docs_owner": "5f0c8a2e-1b7e-4c59-9d0a-2f4b1c3d4e5f",
        "docs_title": title,
        "docs_description": "Quarterly notes",
        "docs_tags": "macro,rates",
        "docs_file_path": "documents/outlook.pdf",
        "uploaded_at": "2024-05-01T10:00:00"
    })
}
