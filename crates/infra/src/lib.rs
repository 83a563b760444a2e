//! Infrastructure layer: relational store, schema, services and DB config.

pub mod config;
pub mod services;
pub mod store;

pub use config::DatabaseConfig;
pub use services::{AccountError, AccountService, ClassError, ClassService, IssuedToken, Registration};
pub use store::{
    EnrolledClass, InMemorySchoolStore, PostgresSchoolStore, RosterEntry, SchoolStore, StoreError,
    schema::ensure_schema,
};
