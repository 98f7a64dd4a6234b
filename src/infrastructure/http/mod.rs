//! HTTP REST API routes

mod adventure_routes;
mod credentials_routes;
mod save_routes;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::error;

use crate::application::services::SaveError;
use crate::infrastructure::state::AppState;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Adventure routes
        .route(
            "/api/adventure",
            get(adventure_routes::get_adventure)
                .post(adventure_routes::start_adventure)
                .delete(adventure_routes::delete_adventure),
        )
        .route(
            "/api/adventure/opening",
            post(adventure_routes::generate_opening),
        )
        .route("/api/adventure/turns", post(adventure_routes::submit_turn))
        .route(
            "/api/adventure/rolls",
            post(adventure_routes::quick_roll_dice),
        )
        // Save file routes
        .route("/api/save/export", get(save_routes::export_save))
        .route("/api/save/import", post(save_routes::import_save))
        .route("/api/save/status", get(save_routes::save_status))
        // Credential routes
        .route(
            "/api/credentials",
            get(credentials_routes::get_credentials).put(credentials_routes::update_credentials),
        )
}

/// Status for errors raised while reading or writing the stored adventure
pub(crate) fn save_error(e: SaveError) -> (StatusCode, String) {
    match e {
        SaveError::NoActiveAdventure => (StatusCode::NOT_FOUND, e.to_string()),
        SaveError::PersistenceCorruption(_) | SaveError::Storage(_) => {
            error!("Save storage failure: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::application::ports::outbound::{
        ApiCredentials, KeyValueStorePort, LlmError, LlmProviderPort, ProviderFactoryPort,
        ProviderKind, ProviderReply, ProviderRequest, ToolInvocation, UnsupportedProviderError,
    };
    use crate::application::services::TURN_FAILED_MESSAGE;
    use crate::infrastructure::config::{AppConfig, ProviderConfig};
    use crate::infrastructure::persistence::InMemoryKeyValueStore;

    /// Provider answering from a fixed script, first entry first
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<ProviderReply, LlmError>>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<ProviderReply, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
            })
        }

        fn next(&self) -> Result<ProviderReply, LlmError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(narrative("Nothing happens.")))
        }
    }

    #[async_trait]
    impl LlmProviderPort for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        async fn send(&self, _request: &ProviderRequest) -> Result<ProviderReply, LlmError> {
            self.next()
        }

        async fn follow_up(
            &self,
            _request: &ProviderRequest,
            _previous: &ProviderReply,
        ) -> Result<ProviderReply, LlmError> {
            self.next()
        }
    }

    struct ScriptedFactory {
        provider: Arc<ScriptedProvider>,
    }

    impl ProviderFactoryPort for ScriptedFactory {
        fn create(
            &self,
            credentials: &ApiCredentials,
        ) -> Result<Arc<dyn LlmProviderPort>, UnsupportedProviderError> {
            credentials.kind()?;
            Ok(self.provider.clone())
        }
    }

    fn narrative(text: &str) -> ProviderReply {
        ProviderReply {
            narrative: text.to_string(),
            tool_invocations: vec![],
            assistant_record: json!({"role": "assistant", "content": text}),
        }
    }

    fn tool_call(name: &str, arguments: Value) -> ProviderReply {
        ProviderReply {
            narrative: String::new(),
            tool_invocations: vec![ToolInvocation {
                call_id: None,
                name: name.to_string(),
                arguments,
            }],
            assistant_record: json!({"role": "assistant", "content": null}),
        }
    }

    fn config(default_credentials: Option<ApiCredentials>) -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            server_port: 0,
            default_credentials,
            providers: ProviderConfig::default(),
        }
    }

    fn app_state(replies: Vec<Result<ProviderReply, LlmError>>) -> Arc<AppState> {
        let credentials = ApiCredentials::new(ProviderKind::OpenAi, "sk-test");
        app_state_with(Some(credentials), replies)
    }

    fn app_state_with(
        credentials: Option<ApiCredentials>,
        replies: Vec<Result<ProviderReply, LlmError>>,
    ) -> Arc<AppState> {
        let store: Arc<dyn KeyValueStorePort> = Arc::new(InMemoryKeyValueStore::new());
        let factory = ScriptedFactory {
            provider: ScriptedProvider::new(replies),
        };
        Arc::new(AppState::with_parts(
            config(credentials),
            store,
            Arc::new(factory),
        ))
    }

    fn app(state: &Arc<AppState>) -> Router {
        create_routes().with_state(state.clone())
    }

    async fn call(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    fn new_wizard() -> Value {
        json!({
            "creation": {
                "name": "Mira",
                "race": "Elf",
                "class": "Wizard",
                "abilities": {
                    "strength": 8,
                    "dexterity": 14,
                    "constitution": 14,
                    "intelligence": 15,
                    "wisdom": 12,
                    "charisma": 10
                },
                "spells": ["Magic Missile"]
            },
            "preferences": {"backstory": "Exiled scholar", "adventureDescription": "Lost library"}
        })
    }

    async fn start(state: &Arc<AppState>) -> Value {
        let (status, body) = call(state, "POST", "/api/adventure", Some(new_wizard())).await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_no_adventure_is_not_found() {
        let state = app_state(vec![]);
        let (status, _) = call(&state, "GET", "/api/adventure", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_adventure_from_creation() {
        let state = app_state(vec![]);
        let body = start(&state).await;

        assert_eq!(body["character"]["hitPoints"]["max"], 8);
        assert_eq!(body["character"]["class"], "Wizard");
        assert_eq!(body["hasOpening"], false);
        assert_eq!(body["messages"], json!([]));
        assert_eq!(body["adventurePreferences"]["backstory"], "Exiled scholar");

        let (status, stored) = call(&state, "GET", "/api/adventure", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["character"]["name"], "Mira");
    }

    #[tokio::test]
    async fn test_opening_then_turn_persists_tool_effects() {
        let state = app_state(vec![
            Ok(narrative("The library doors creak open.")),
            Ok(tool_call("modify_hp", json!({"amount": -3}))),
            Ok(narrative("A falling shelf clips your shoulder.")),
        ]);
        start(&state).await;

        let (status, opening) = call(&state, "POST", "/api/adventure/opening", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(opening["narrative"], "The library doors creak open.");
        assert_eq!(opening["adventure"]["hasOpening"], true);

        let (status, again) = call(&state, "POST", "/api/adventure/opening", None).await;
        assert_eq!(status, StatusCode::CONFLICT, "{again}");

        let (status, turn) = call(
            &state,
            "POST",
            "/api/adventure/turns",
            Some(json!({"action": "I pull a book from the shelf"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(turn["narrative"], "A falling shelf clips your shoulder.");
        assert_eq!(turn["followUpSent"], true);
        assert_eq!(turn["toolResults"][0]["tool"], "modify_hp");
        assert_eq!(turn["toolResults"][0]["applied"], true);

        let (_, stored) = call(&state, "GET", "/api/adventure", None).await;
        assert_eq!(stored["character"]["hitPoints"]["current"], 5);
        let messages = stored["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["content"], "A falling shelf clips your shoulder.");
    }

    #[tokio::test]
    async fn test_malformed_tool_call_persists_nothing() {
        let state = app_state(vec![Ok(tool_call("modify_hp", json!({"amount": "lots"})))]);
        start(&state).await;

        let (status, _) = call(
            &state,
            "POST",
            "/api/adventure/turns",
            Some(json!({"action": "I drink the potion"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, stored) = call(&state, "GET", "/api/adventure", None).await;
        assert_eq!(stored["messages"], json!([]));
        assert_eq!(stored["character"]["hitPoints"]["current"], 8);
    }

    #[tokio::test]
    async fn test_upstream_failure_stores_placeholder() {
        let state = app_state(vec![Err(LlmError::UpstreamApi {
            provider: ProviderKind::OpenAi,
            status: "500 Internal Server Error".to_string(),
        })]);
        start(&state).await;

        let (status, turn) = call(
            &state,
            "POST",
            "/api/adventure/turns",
            Some(json!({"action": "I look around"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(turn["narrative"], TURN_FAILED_MESSAGE);
        assert!(turn["upstreamError"].is_string());
        assert_eq!(turn["adventure"]["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_turn_requires_credentials() {
        let state = app_state_with(None, vec![]);
        start(&state).await;

        let (status, _) = call(
            &state,
            "POST",
            "/api/adventure/turns",
            Some(json!({"action": "Hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_empty_action_is_rejected() {
        let state = app_state(vec![]);
        start(&state).await;

        let (status, _) = call(
            &state,
            "POST",
            "/api/adventure/turns",
            Some(json!({"action": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_turn_rejected_while_another_runs() {
        let state = app_state(vec![]);
        start(&state).await;

        let _held = state.turn_lock.lock().await;
        let (status, _) = call(
            &state,
            "POST",
            "/api/adventure/turns",
            Some(json!({"action": "Hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_credentials_are_stored_without_echoing_key() {
        let state = app_state_with(None, vec![]);

        let (_, before) = call(&state, "GET", "/api/credentials", None).await;
        assert_eq!(before, json!({"provider": null, "configured": false}));

        let (status, _) = call(
            &state,
            "PUT",
            "/api/credentials",
            Some(json!({"provider": "mistral", "apiKey": "k"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, updated) = call(
            &state,
            "PUT",
            "/api/credentials",
            Some(json!({"provider": "Claude", "apiKey": "sk-ant-secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["provider"], "anthropic");

        let (_, after) = call(&state, "GET", "/api/credentials", None).await;
        assert_eq!(after["configured"], true);
        assert!(!after.to_string().contains("sk-ant-secret"));
    }

    #[tokio::test]
    async fn test_quick_roll_uses_character() {
        let state = app_state(vec![]);
        start(&state).await;

        let (status, roll) = call(
            &state,
            "POST",
            "/api/adventure/rolls",
            Some(json!({"kind": "initiative"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(roll["modifier"], 2);
        let total = roll["total"].as_i64().unwrap();
        assert!((3..=22).contains(&total));
        assert_eq!(roll["label"], format!("Initiative Roll: {}", total));
    }

    #[tokio::test]
    async fn test_export_import_and_status() {
        let state = app_state(vec![]);
        start(&state).await;

        let (status, exported) = call(&state, "GET", "/api/save/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(exported["timestamp"].is_string());

        let (_, saved) = call(&state, "GET", "/api/save/status", None).await;
        assert!(saved["lastSaved"].is_string());

        let (status, _) = call(&state, "DELETE", "/api/adventure", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&state, "GET", "/api/adventure", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, imported) = call(&state, "POST", "/api/save/import", Some(exported)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(imported["character"]["name"], "Mira");
    }

    #[tokio::test]
    async fn test_invalid_import_keeps_current_adventure() {
        let state = app_state(vec![]);
        start(&state).await;

        let (status, _) = call(
            &state,
            "POST",
            "/api/save/import",
            Some(json!({"character": {"name": "Nobody"}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, stored) = call(&state, "GET", "/api/adventure", None).await;
        assert_eq!(stored["character"]["name"], "Mira");
    }
}
