//! Anonymous record types, minted on demand.
//!
//! `new(a alias X, ...)` expressions and hosts calling [`create_class`]
//! both go through a process-wide cache keyed by the structural signature
//! of the requested field list: same names and types in the same order
//! means the same minted type, for the lifetime of the process.

mod factory;
mod record;
mod signature;

pub use factory::create_class;
pub use record::{Record, RecordError};
pub use signature::{DynamicProperty, Signature};
