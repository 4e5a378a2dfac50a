//! # vstory-revenue
//!
//! Pure coin arithmetic for the ledger.
//!
//! ## Modules
//!
//! - [`splits`]: Author / platform / tax split of a gross amount
//! - [`referral`]: Referral commission rates and flooring

pub mod referral;
pub mod splits;

pub use splits::{split, split_untrusted};
