//! Browser implementations of the client seams, plus routing.

mod http;
pub mod route;
pub mod router;
mod storage;

pub use http::FetchHttpClient;
pub use storage::LocalTokenStore;
