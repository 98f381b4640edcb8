// src/db/mod.rs
// Persistence layer: connection pool, schema bootstrap, and one module
// per project-scoped entity family (§3, §4.6, §6).

pub mod context;
pub mod decision;
pub mod pool;
pub mod project;
pub mod schema;
pub mod session;
pub mod task;

pub use pool::DatabasePool;
