//! In-memory document store for jsonkv.
//!
//! [`InMemoryJsonStore`] holds one JSON document per key and answers the
//! complete operation set through [`jsonkv_protocol::RemoteConnection`]. It
//! is the backend the client tests run against, the store the `jsonkv` CLI
//! scripts execute on, and a drop-in for embedding without a server.
//!
//! # Design Rules
//!
//! 1. Replies and error texts follow the remote store's shapes and wording.
//! 2. A new key can only be created by a write at the root.
//! 3. A write creates at most the last segment of its path; ancestors must
//!    exist.
//! 4. Every call is recorded, in arrival order.

pub mod document;
pub mod error;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryJsonStore, RecordedCall};
