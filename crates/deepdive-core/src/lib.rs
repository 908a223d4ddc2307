pub mod client;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod interpreter;
pub mod offline;
pub mod protocol;
pub mod session;

// Re-export main types for convenience
pub use client::{ApiClient, Backend};
pub use config::Config;
pub use connectivity::{check_connection, Connectivity, Prober};
pub use error::{ApiError, ConfigError};
pub use interpreter::{interpret, Outcome};
pub use offline::offline_fallback;
pub use protocol::{Query, Response, Status};
pub use session::{Dialog, Dispatch, Output, OutputKind, Session};

#[cfg(any(test, feature = "testing"))]
pub use client::MockBackend;
