//! # Archive Identity
//!
//! Privacy-preserving participant identities.
//!
//! Raw sender addresses never leave ingestion. Everything downstream works
//! with either a masked display form (`jo***e@example.com`) or an opaque,
//! filesystem-safe token derived from it (`jo___e_at_example_com`).
//!
//! All functions here are pure: the same input always yields the same output,
//! which is what lets author pages group messages across the whole archive.

mod error;
mod mask;

pub use error::{IdentityError, Result};
pub use mask::{
    address_part, derive_identity, mask_address, mask_address_with, mask_all_emails, mask_email,
    MASK,
};

use serde::{Deserialize, Serialize};

/// Token plus display form for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub token: String,
    pub display: String,
}

impl Identity {
    pub fn resolve(raw_from: &str) -> Result<Self> {
        Ok(Self {
            token: derive_identity(raw_from)?,
            display: mask_address(raw_from)?,
        })
    }
}
