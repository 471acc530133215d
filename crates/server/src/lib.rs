//! # Server
//!
//! Minimal HTTP surface: `GET /hello` answers `200 text/plain` with the
//! configured greeting.
//!
//! # Example
//!
//! ```no_run
//! use contracts::ServerConfig;
//! use server::{shutdown_signal, HttpServer};
//!
//! # async fn run() -> Result<(), server::ServerError> {
//! let server = HttpServer::bind(&ServerConfig::default()).await?;
//! server.serve(shutdown_signal()).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod router;
mod server;

pub use error::ServerError;
pub use handler::HelloHandler;
pub use router::build_router;
pub use server::{shutdown_signal, HttpServer};
