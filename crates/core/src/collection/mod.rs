//! Collection domain models.

mod collection_item_model;

pub use collection_item_model::*;
