pub mod category;
pub mod errors;
pub mod product;

pub use category::{Category, CategoryPatch, CategorySearchParams, NewCategory};
pub use errors::DomainError;
pub use product::{Product, Sku};
