//! Client for path-addressed JSON document stores.
//!
//! [`JsonClient`] is the main entry point: one typed async method per store
//! operation, built on the [`CommandDispatcher`] (handle cache, reply
//! normalization, failure classification) and the [`AncestorMaterializer`]
//! (writes that create missing ancestors).
//!
//! ```no_run
//! # async fn demo(connection: std::sync::Arc<dyn jsonkv_protocol::RemoteConnection>) -> jsonkv_client::ClientResult<()> {
//! use jsonkv_client::{JsonClient, SetOptions};
//! use serde_json::json;
//!
//! let client = JsonClient::new(connection);
//! client
//!     .set_with("user:1", "profile.address.city", json!("Oslo"), SetOptions::new().auto_create(true))
//!     .await?;
//! let city = client.get("user:1", "profile.address.city").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod materializer;
pub mod write;

pub use client::JsonClient;
pub use config::ClientConfig;
pub use dispatcher::CommandDispatcher;
pub use error::{ClientError, ClientResult};
pub use materializer::{AncestorMaterializer, MaterializationPlan};
pub use write::{Materialization, SetOptions, WriteResult};

// Re-export the types callers need alongside the client.
pub use jsonkv_protocol::{FailureCategory, Operation, RemoteConnection, SetCondition, TriggerPattern};
pub use jsonkv_types::{normalize, CanonicalPath, JsonType, Path, PathInput, Segment};
