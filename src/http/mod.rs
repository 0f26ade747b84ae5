//! Authenticated request execution over a pluggable HTTP transport.

mod executor;
mod transport;

pub use executor::{AuthClient, RefreshOutcome, TOKEN_PATH, TOKEN_REFRESH_PATH};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, TransportError};
