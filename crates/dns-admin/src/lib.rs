//! The mutation engine shared by the administrative CLI and the reconciling
//! controller.
//!
//! Every operation is a read-modify-write of one document per name, with
//! de-duplication by natural key and the removal collapse rules enforced by
//! the record model. There is no compare-and-swap: administrative writes are
//! rare and serialised through human workflows or a single controller
//! leader.

use dns_store::StoreError;
use thiserror::Error;

mod engine;
mod filter;
mod validate;

pub use engine::{AddressPatch, Engine, ListEntry};
pub use filter::{AddressSelector, KindSelector, ListFilter};
pub use validate::{parse_srv_value, parse_tristate, validate_domain, validate_label};

#[derive(Debug, Error)]
pub enum AdminError {
    /// A validation failure: bad IP, bad domain, unknown kind, port out of
    /// range. The CLI maps this to exit code 2.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The stored document claims a different domain than the one encoded
    /// in its key; refusing to touch it.
    #[error("record at '{key}' belongs to domain '{found}', not '{expected}'")]
    DomainMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdminError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AdminError::InvalidArgument(msg.into())
    }

    /// Whether this error should surface as a usage error (exit code 2)
    /// rather than an execution error (exit code 1).
    pub fn is_usage_error(&self) -> bool {
        matches!(self, AdminError::InvalidArgument(_))
    }
}
