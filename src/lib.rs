// =========================================================
// Cross-platform logging macros
// =========================================================

#[macro_export]
macro_rules! log_info {
    ($($t:tt)*) => ($crate::logging::write($crate::logging::Level::Info, &format!($($t)*)))
}

#[macro_export]
macro_rules! log_warn {
    ($($t:tt)*) => ($crate::logging::write($crate::logging::Level::Warn, &format!($($t)*)))
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)*) => ($crate::logging::write($crate::logging::Level::Error, &format!($($t)*)))
}

pub mod api;
pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod normalize;
pub mod request;
pub mod session;
pub mod storage;
pub mod strategy;
pub mod testdata;
pub mod upload;

use std::rc::Rc;

pub use api::FloodWatchApi;
pub use batch::{BatchOutcome, process_batch};
pub use client::{ApiCall, ApiClient};
pub use config::{BuildMode, ClientConfig};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use events::{AuthEvent, AuthEventBus, ListenerId};
pub use request::{HttpClient, HttpRequest, HttpResponse};
pub use session::{Session, SessionController, SessionPhase};
pub use storage::{MemoryTokenStore, TokenStore};
pub use strategy::{DevelopmentFallback, LoginStrategy, StrictLogin};
pub use testdata::{FloodDataOverrides, TestDataApi};
pub use upload::{FileUpload, ObjectUploader};

#[cfg(not(target_arch = "wasm32"))]
pub use request::ReqwestHttpClient;

pub use floodwatch_shared as shared;

// =========================================================
// Composition root
// =========================================================

/// Everything the dashboard needs, wired around one client.
///
/// The API facade, the session controller, the uploader and the test-data
/// tools share the same [`ApiClient`], so they share the token store and the
/// invalidation signal.
pub struct AdminBackend<C: HttpClient> {
    pub api: FloodWatchApi<C>,
    pub session: Rc<SessionController<C>>,
    pub uploader: ObjectUploader<C>,
    pub test_data: TestDataApi<C>,
}

impl<C: HttpClient> Clone for AdminBackend<C> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            session: self.session.clone(),
            uploader: self.uploader.clone(),
            test_data: self.test_data.clone(),
        }
    }
}

impl<C: HttpClient> AdminBackend<C> {
    pub fn new(config: ClientConfig, transport: C, tokens: Rc<dyn TokenStore>) -> Self {
        log_info!(
            "FloodWatch client: base={:?} mode={:?}",
            config.base_url,
            config.mode
        );
        let client = Rc::new(ApiClient::new(config, transport, tokens));
        let api = FloodWatchApi::new(client.clone());
        let session = Rc::new(SessionController::new(api.clone()));
        let uploader = ObjectUploader::new(client.clone());
        let test_data = TestDataApi::new(client);
        Self {
            api,
            session,
            uploader,
            test_data,
        }
    }

    pub fn client(&self) -> &Rc<ApiClient<C>> {
        self.api.client()
    }
}
