use super::app_error::AppError;

pub(super) fn map_database_error(
    code: Option<&str>,
    constraint: Option<&str>,
    message: &str,
) -> Option<AppError> {
    match code {
        Some("23505") => Some(unique_violation(constraint)),
        Some("23502") => Some(AppError::validation_error(
            required_field_message_from_db(message)
                .unwrap_or_else(|| "required field is missing".to_string()),
        )),
        Some("23503") => Some(AppError::NotFound(
            foreign_key_message_from_constraint(constraint).to_string(),
        )),
        Some("23514") => Some(AppError::validation_error(
            check_message_from_constraint(constraint),
        )),
        Some("22P02") => Some(AppError::validation_error("invalid input format")),
        Some("08001") | Some("08006") => Some(AppError::ServiceUnavailable {
            service: "database".to_string(),
            message: "Unable to connect to database. Please try again later.".to_string(),
        }),
        Some("53300") => Some(AppError::ServiceUnavailable {
            service: "database".to_string(),
            message: "Service temporarily unavailable. Please try again later.".to_string(),
        }),
        Some("40001") | Some("40P01") => Some(AppError::Conflict(
            "concurrent update detected, please retry".to_string(),
        )),
        Some("55P03") => Some(AppError::Conflict(
            "Resource is currently locked. Please try again.".to_string(),
        )),
        _ => None,
    }
}

/// Sibling-name and sku-code collisions are input problems, everything else is a conflict.
fn unique_violation(constraint: Option<&str>) -> AppError {
    match constraint {
        Some("uq_categories_sibling_name") => AppError::validation_error(
            "name: a category with this name already exists under the same parent",
        ),
        Some("uq_skus_code") => {
            AppError::validation_error("code: a sku with this code already exists")
        }
        _ => AppError::Conflict(conflict_message_from_constraint(constraint).to_string()),
    }
}

pub(super) fn conflict_message_from_constraint(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("categories_pkey") => "category already exists",
        Some("products_pkey") => "product already exists",
        Some("skus_pkey") => "sku already exists",
        _ => "resource already exists",
    }
}

fn foreign_key_message_from_constraint(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("categories_parent_id_fkey") => "parent category not found",
        Some("products_category_id_fkey") => "category not found",
        Some("skus_product_id_fkey") => "product not found",
        _ => "referenced resource does not exist",
    }
}

fn check_message_from_constraint(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("ck_categories_level") => "parent_id: maximum category depth exceeded",
        Some("ck_categories_sort_order") => "sort_order: must be zero or greater",
        Some("ck_categories_not_own_parent") => "parent_id: category cannot be its own parent",
        Some("ck_products_price") | Some("ck_skus_price") => "price: must be zero or greater",
        _ => "request violates validation rules",
    }
}

pub(super) fn required_field_message_from_db(message: &str) -> Option<String> {
    let marker = "column \"";
    let start = message.find(marker)?;
    let rest = &message[start + marker.len()..];
    let end = rest.find('"')?;
    Some(format!("{} is required", &rest[..end]))
}
