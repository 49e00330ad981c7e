use super::*;
use crate::client::ApiClient;
use crate::config::{BuildMode, ClientConfig};
use crate::error::ApiErrorKind;
use crate::request::MockHttpClient;
use crate::storage::MemoryTokenStore;
use crate::strategy::StrictLogin;
use floodwatch_shared::PLACEHOLDER_TOKEN_PREFIX;
use serde_json::json;

const BASE: &str = "http://backend.test";

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

struct Harness {
    controller: SessionController<MockHttpClient>,
    store: Rc<MemoryTokenStore>,
}

impl Harness {
    fn new(mode: BuildMode, store: MemoryTokenStore) -> Self {
        let store = Rc::new(store);
        let config = ClientConfig::default().with_base_url(BASE).with_mode(mode);
        let client = ApiClient::new(config, MockHttpClient::new(), store.clone());
        let controller = SessionController::new(FloodWatchApi::new(Rc::new(client)));
        Self { controller, store }
    }

    fn mock(&self) -> &MockHttpClient {
        self.controller.api().client().transport()
    }

    fn stored(&self) -> Option<String> {
        self.store.load()
    }
}

fn ops_user() -> serde_json::Value {
    json!({ "id": 7, "email": "ops@example.org", "name": "Ops", "role": "admin" })
}

// =========================================================
// init
// =========================================================

#[tokio::test]
async fn test_init_without_token_is_unauthenticated() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    assert_eq!(h.controller.snapshot().phase(), SessionPhase::Unauthenticated);

    let session = h.controller.init().await;
    assert!(!session.is_authenticated());
    assert!(!session.is_loading);
    assert!(h.mock().requests.borrow().is_empty());
}

#[tokio::test]
async fn test_init_verifies_real_token() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::with_token("jwt"));
    assert_eq!(h.controller.snapshot().phase(), SessionPhase::Verifying);
    h.mock()
        .mock_response(&url("/user/profile"), 200, json!({ "data": ops_user() }));

    let session = h.controller.init().await;

    assert_eq!(session.phase(), SessionPhase::Authenticated);
    assert_eq!(session.token.as_deref(), Some("jwt"));
    assert_eq!(session.user.unwrap().display_name(), "Ops");
    let sent = h.mock().last_request().unwrap();
    assert_eq!(sent.header("Authorization"), Some("Bearer jwt"));
}

#[tokio::test]
async fn test_init_rejected_token_clears_everything() {
    for mode in [BuildMode::Production, BuildMode::Development] {
        let h = Harness::new(mode, MemoryTokenStore::with_token("expired"));
        h.mock().mock_response(
            &url("/user/profile"),
            401,
            json!({ "message": "Unauthenticated." }),
        );

        let session = h.controller.init().await;

        assert!(!session.is_authenticated(), "mode {:?}", mode);
        assert!(session.token.is_none());
        assert!(h.stored().is_none());
    }
}

#[tokio::test]
async fn test_init_server_error_production_signs_out() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::with_token("jwt"));
    h.mock()
        .mock_response(&url("/user/profile"), 500, json!({ "message": "down" }));

    let session = h.controller.init().await;

    assert_eq!(session.phase(), SessionPhase::Unauthenticated);
    assert!(h.stored().is_none());
}

#[tokio::test]
async fn test_init_server_error_development_keeps_token() {
    let h = Harness::new(BuildMode::Development, MemoryTokenStore::with_token("jwt"));
    h.mock()
        .mock_unreachable(&url("/user/profile"), "connection refused");

    let session = h.controller.init().await;

    assert!(session.is_authenticated());
    assert_eq!(session.token.as_deref(), Some("jwt"));
    assert_eq!(h.stored().as_deref(), Some("jwt"));
}

#[tokio::test]
async fn test_init_placeholder_token_development_skips_backend() {
    let token = format!("{}1717230600000", PLACEHOLDER_TOKEN_PREFIX);
    let h = Harness::new(BuildMode::Development, MemoryTokenStore::with_token(&token));

    let session = h.controller.init().await;

    assert!(session.is_authenticated());
    assert_eq!(session.user.unwrap().role, "admin");
    assert!(h.mock().requests.borrow().is_empty());
}

#[tokio::test]
async fn test_init_placeholder_token_production_rejected() {
    let token = format!("{}1717230600000", PLACEHOLDER_TOKEN_PREFIX);
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::with_token(&token));

    let session = h.controller.init().await;

    assert!(!session.is_authenticated());
    assert!(h.stored().is_none());
    assert!(h.mock().requests.borrow().is_empty());
}

// =========================================================
// login
// =========================================================

#[tokio::test]
async fn test_login_nested_grant() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    h.mock().mock_response(
        &url("/web/login"),
        200,
        json!({ "success": true, "data": { "token": "T", "user": ops_user() } }),
    );

    let user = h
        .controller
        .login(&LoginCredentials::new("ops@example.org", "pw"))
        .await
        .unwrap();

    assert_eq!(user.id, "7");
    assert_eq!(h.stored().as_deref(), Some("T"));
    let session = h.controller.snapshot();
    assert_eq!(session.token.as_deref(), Some("T"));
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_login_without_user_synthesizes_one() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    h.mock()
        .mock_response(&url("/web/login"), 200, json!({ "token": "T2" }));

    let user = h
        .controller
        .login(&LoginCredentials::new("frans_admin", "pw"))
        .await
        .unwrap();

    assert_eq!(user.email, "frans_admin");
    assert!(h.controller.is_authenticated());
}

#[tokio::test]
async fn test_login_missing_token_development_mints_placeholder() {
    let h = Harness::new(BuildMode::Development, MemoryTokenStore::new());
    h.mock().mock_response(
        &url("/web/login"),
        200,
        json!({ "status": "ok", "message": "Logged in" }),
    );

    let user = h
        .controller
        .login(&LoginCredentials::new("field_officer", "pw"))
        .await
        .unwrap();

    let stored = h.stored().unwrap();
    assert!(stored.starts_with(PLACEHOLDER_TOKEN_PREFIX));
    assert_eq!(user.display_name(), "field_officer");
}

#[tokio::test]
async fn test_login_missing_token_production_fails() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    h.mock()
        .mock_response(&url("/web/login"), 200, json!({ "status": "ok" }));

    let err = h
        .controller
        .login(&LoginCredentials::new("ops", "pw"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::Decode);
    assert!(!h.controller.is_authenticated());
    assert!(h.stored().is_none());
}

#[tokio::test]
async fn test_login_server_error_development_placeholder_session() {
    let h = Harness::new(BuildMode::Development, MemoryTokenStore::new());
    h.mock().mock_response(
        &url("/web/login"),
        500,
        json!({ "message": "Internal Server Error" }),
    );

    let user = h
        .controller
        .login(&LoginCredentials::new("frans_admin", "secret"))
        .await
        .unwrap();

    assert_eq!(user.display_name(), "frans_admin");
    let session = h.controller.snapshot();
    assert!(session.is_authenticated());
    assert!(is_placeholder_token(session.token.as_deref().unwrap()));
    assert!(is_placeholder_token(&h.stored().unwrap()));
}

#[tokio::test]
async fn test_login_server_error_production_propagates() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    h.mock().mock_response(
        &url("/web/login"),
        500,
        json!({ "message": "Internal Server Error" }),
    );

    let err = h
        .controller
        .login(&LoginCredentials::new("frans_admin", "secret"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.display_message(), "Internal Server Error");
    assert_eq!(err.spans().last().unwrap().operation, "session.login");
    let session = h.controller.snapshot();
    assert!(!session.is_authenticated());
    assert!(!session.is_loading);
    assert!(h.stored().is_none());
}

#[tokio::test]
async fn test_login_toggles_loading() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    h.mock()
        .mock_response(&url("/web/login"), 200, json!({ "token": "T" }));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    h.controller
        .observe(move |s| sink.borrow_mut().push((s.is_loading, s.is_authenticated())));

    h.controller
        .login(&LoginCredentials::new("ops", "pw"))
        .await
        .unwrap();

    assert_eq!(*seen.borrow(), vec![(true, false), (false, true)]);
}

#[tokio::test]
async fn test_strict_strategy_can_be_injected() {
    let store = Rc::new(MemoryTokenStore::new());
    let config = ClientConfig::default()
        .with_base_url(BASE)
        .with_mode(BuildMode::Development);
    let client = ApiClient::new(config, MockHttpClient::new(), store.clone());
    let controller =
        SessionController::with_strategy(FloodWatchApi::new(Rc::new(client)), Rc::new(StrictLogin));

    let err = controller
        .login(&LoginCredentials::new("ops", "pw"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(store.load().is_none());
}

// =========================================================
// logout
// =========================================================

#[tokio::test]
async fn test_login_then_logout_leaves_nothing() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    h.mock()
        .mock_response(&url("/web/login"), 200, json!({ "token": "T", "user": ops_user() }));
    h.mock()
        .mock_response(&url("/auth/logout"), 200, json!({ "success": true }));

    h.controller
        .login(&LoginCredentials::new("ops@example.org", "pw"))
        .await
        .unwrap();
    h.controller.logout().await;

    let session = h.controller.snapshot();
    assert!(session.user.is_none());
    assert!(session.token.is_none());
    assert!(!session.is_loading);
    assert!(h.stored().is_none());

    let logout = h.mock().last_request().unwrap();
    assert_eq!(logout.url, url("/auth/logout"));
    assert_eq!(logout.header("Authorization"), Some("Bearer T"));
}

#[tokio::test]
async fn test_logout_failure_still_signs_out() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::with_token("jwt"));
    h.mock()
        .mock_response(&url("/user/profile"), 200, ops_user());
    h.mock()
        .mock_unreachable(&url("/auth/logout"), "offline");

    h.controller.init().await;
    assert!(h.controller.is_authenticated());

    h.controller.logout().await;
    assert!(!h.controller.is_authenticated());
    assert!(h.stored().is_none());
}

#[tokio::test]
async fn test_logout_with_placeholder_skips_backend() {
    let token = format!("{}42", PLACEHOLDER_TOKEN_PREFIX);
    let h = Harness::new(BuildMode::Development, MemoryTokenStore::with_token(&token));
    h.controller.init().await;
    assert!(h.controller.is_authenticated());

    h.controller.logout().await;

    assert_eq!(h.mock().request_count(&url("/auth/logout")), 0);
    assert!(h.stored().is_none());
    assert!(!h.controller.is_authenticated());
}

// =========================================================
// invalidation, update_user, dispose
// =========================================================

#[tokio::test]
async fn test_any_rejection_clears_session() {
    let h = Harness::new(BuildMode::Development, MemoryTokenStore::new());
    h.mock()
        .mock_response(&url("/web/login"), 200, json!({ "token": "T", "user": ops_user() }));
    h.mock()
        .mock_response(&url("/web/getclosedroads"), 403, json!({ "message": "Forbidden" }));

    h.controller
        .login(&LoginCredentials::new("ops@example.org", "pw"))
        .await
        .unwrap();
    assert!(h.controller.is_authenticated());

    let err = h.controller.api().list_closed_roads().await.unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::Forbidden);
    assert!(!h.controller.is_authenticated());
    assert!(h.controller.snapshot().token.is_none());
    assert!(h.stored().is_none());
}

#[tokio::test]
async fn test_update_user_merges_or_creates() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());

    let created = h.controller.update_user(UserPatch {
        email: Some("new@example.org".into()),
        ..Default::default()
    });
    assert_eq!(created.email, "new@example.org");
    assert_eq!(created.role, "");

    let merged = h.controller.update_user(UserPatch {
        name: Some("Night Shift".into()),
        ..Default::default()
    });
    assert_eq!(merged.email, "new@example.org");
    assert_eq!(merged.display_name(), "Night Shift");
    assert_eq!(h.controller.user(), Some(merged));
    assert!(h.mock().requests.borrow().is_empty());
}

#[tokio::test]
async fn test_dispose_detaches_from_invalidation() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    let events = h.controller.api().client().events().clone();
    assert_eq!(events.listener_count(), 1);

    h.controller.dispose();
    h.controller.dispose();

    assert!(h.controller.is_disposed());
    assert_eq!(events.listener_count(), 0);
}

#[tokio::test]
async fn test_drop_unsubscribes() {
    let h = Harness::new(BuildMode::Production, MemoryTokenStore::new());
    let events = h.controller.api().client().events().clone();
    drop(h);
    assert_eq!(events.listener_count(), 0);
}
