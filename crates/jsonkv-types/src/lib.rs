//! Foundation types for jsonkv.
//!
//! This crate provides the path-addressing types shared by the protocol,
//! the client and the in-memory store. Every other jsonkv crate depends on
//! `jsonkv-types`.
//!
//! # Key Types
//!
//! - [`Segment`] — One property name or array index
//! - [`Path`] — Immutable ordered segment list
//! - [`PathInput`] — A path as a caller supplies it (dotted text or segments)
//! - [`CanonicalPath`] — Bracket-form path text as sent to the store
//! - [`JsonType`] — Type names reported by the store's type query

pub mod error;
pub mod json;
pub mod path;

pub use error::{TypeError, TypeResult};
pub use json::JsonType;
pub use path::{normalize, CanonicalPath, Path, PathInput, Segment, ROOT};
