//! HandyHub HTTP API
//!
//! Carries the booking request/response contract over HTTP.
//!
//! # Architecture
//!
//! - **Routes**: axum router mapping paths to handlers
//! - **State**: shared database handle, listeners and notification channel
//! - **Server**: binds, serves, sweeps expired tokens, shuts down gracefully
//!
//! # Usage
//!
//! ```ignore
//! let state = ApiState::new(db, config, Arc::new(LogNotifier));
//! let server = Server::start(bind, state).await?;
//! tokio::signal::ctrl_c().await?;
//! server.shutdown();
//! server.wait().await;
//! ```

pub mod error;
mod extract;
mod handlers;
pub mod protocol;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, Result};
pub use routes::router;
pub use server::Server;
pub use state::ApiState;
