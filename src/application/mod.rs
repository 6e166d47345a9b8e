pub mod category;
pub mod pagination;
mod product_service;

pub use category::{CategoryCache, CategoryService, CategoryView};
pub use product_service::ProductService;
