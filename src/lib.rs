pub mod error;
pub mod config;
pub mod session;
pub mod http;
pub mod api;
pub mod validation;
pub mod directory;
pub mod navigation;
pub mod cli;

pub use api::ApiClient;
pub use config::{ClientConfig, RefreshMode};
pub use error::{AppError, AppResult};
pub use http::{AuthClient, RefreshOutcome};
pub use session::{FileStorage, MemoryStorage, Role, Session, SessionStorage, SessionStore, SessionUpdate};

// Debug-only printing helper: expands to eprintln! in tests and debug builds.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}
