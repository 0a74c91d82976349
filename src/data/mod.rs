//! Data module - dataset loading and schema normalization

mod loader;
mod schema;

pub use loader::load_dataset;
pub use schema::{normalize, RoleMap, ORDER_MONTH};
