//! Raw transaction ingestion into a SQLite star-schema warehouse.
//!
//! Entry point is [`pipeline::Pipeline`]; each stage is also usable on its
//! own against an explicitly opened [`store::WarehouseStore`].

pub mod config;
pub mod dimension;
pub mod error;
pub mod export;
pub mod fact;
pub mod integrity;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod staging;
pub mod store;
pub mod types;
pub mod validation;
