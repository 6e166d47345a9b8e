use serde::{Deserialize, Deserializer, Serialize};

use crate::application::pagination::{total_pages, DEFAULT_PER_PAGE};

/// Standard error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error label, e.g. "Not found" or "Validation error".
    pub error: String,
    /// Human-readable message naming the offending field or rule.
    pub message: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        Self {
            items,
            total,
            page,
            per_page,
            total_pages: total_pages(total, per_page),
        }
    }
}

pub(crate) const fn default_page() -> i64 {
    1
}

pub(crate) const fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

pub(crate) const fn default_true() -> bool {
    true
}

/// Keeps "field absent" apart from "field set to null" for nullable patch fields.
///
/// Use with `#[serde(default, deserialize_with = "deserialize_optional_field")]`.
pub fn deserialize_optional_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
