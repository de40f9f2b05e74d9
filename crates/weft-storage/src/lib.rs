//! SQLite storage backend for Weft.
//!
//! # Modules
//!
//! - [`registry`]: Per-tenant connection lifecycle and discovery
//! - [`schema`]: Identifier validation and collection provisioning
//! - [`filter`]: Filter-spec compilation to SQL predicate fragments
//! - [`repository`]: Document CRUD, listing, and tenant aggregates
//!
//! # Identifier safety
//!
//! SQLite cannot bind identifiers as parameters, so collection names are
//! interpolated into generated SQL. The allow-list validator in [`schema`]
//! is the hard gate executed before any string formatting; this crate is the
//! only place trusted with raw names.

#![doc = include_str!("../README.md")]

pub mod filter;
pub mod registry;
pub mod repository;
pub mod schema;

pub use filter::{FilterArg, bind_filter_args, compile_filter};
pub use registry::ConnectionRegistry;
pub use repository::DocumentRepository;
pub use schema::{ensure_collection, validate_identifier};
