// Models module - Database entity representations

pub mod product;

pub use product::{Product, ProductRequest};
