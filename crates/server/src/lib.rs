//! Vitrine HTTP API.
//!
//! Exposes the retrieval-augmented product search pipeline over REST:
//!
//! - **Search**: query generation plus per-term k-NN retrieval
//! - **Assist**: the full chat flow (caption → queries → retrieval → reply)
//! - **Media**: presigned image uploads and vision captioning
//! - **Health**: liveness/readiness probes
//!
//! API keys authenticate every `/api/v1` route, with fixed-window rate
//! limiting per key. Errors come back as `{"error": {"code", "message"}}`
//! with upstream dependency failures mapped to 502.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
