// Services module - Data access and health diagnosis

pub mod health;
pub mod product_service;

pub use health::HealthReport;
pub use product_service::{ProductService, ProductStore};
