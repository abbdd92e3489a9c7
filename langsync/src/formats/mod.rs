//! Resource file formats understood by langsync.
//!
//! Only Windows `.resw` files are supported; the reconciliation core itself works on
//! [`crate::types::LocaleStore`] and does not depend on any file format.

pub mod resw;

pub use resw::Format as ReswFormat;
