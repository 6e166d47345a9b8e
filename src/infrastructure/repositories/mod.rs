mod category_repository;
mod product_repository;
mod traits;
mod utils;

pub use category_repository::CategoryRepositoryImpl;
pub use product_repository::ProductRepositoryImpl;
pub use traits::{CategoryRepository, ProductRepository};
pub use utils::escape_like_pattern;
