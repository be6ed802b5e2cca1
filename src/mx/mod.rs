//! DNS MX resolution.
//!
//! The public entry point is [`resolve_mx`], which performs a synchronous
//! lookup using the system resolver and returns the exchange host names in
//! preference order. [`LookupMx`] is the seam used to swap the resolver.

mod error;
mod resolver;
mod types;

pub use error::MxError;
pub use resolver::{LookupMx, SystemResolver, resolve_mx, resolve_mx_with};
pub use types::{MxRecord, MxStatus};
