//! # migsync-git
//!
//! Git operations layer for migsync, built on git2-rs.
//! Reads directories as recorded on a reference without checking it out,
//! resolves branch names (local or remote-tracking) and performs checkout.

mod error;
mod repository;
mod traits;

pub use error::{Error, Result};
pub use repository::Repository;
pub use traits::GitOps;
