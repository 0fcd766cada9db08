//! Repository implementations.
//!
//! Only the in-memory [`LocalRepository`] ships here; no persistence
//! technology is prescribed, and other backends implement the traits in
//! `db::repository` the same way.

pub mod local;

pub use local::LocalRepository;
