//! Domain services over the credential store.

pub mod accounts;
pub mod classes;

pub use accounts::{AccountError, AccountService, IssuedToken, Registration};
pub use classes::{ClassError, ClassService};
