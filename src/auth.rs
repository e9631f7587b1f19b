//! Domain model for accounts, token records, and the audit trail.

pub mod account;
pub mod audit;
pub mod id;
pub mod token;

pub use account::*;
pub use audit::*;
pub use id::*;
pub use token::*;
