//! Domain data types

pub mod payload;
pub mod product;

pub use payload::Payload;
pub use product::{Product, ProductUpdate};
