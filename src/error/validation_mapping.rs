use validator::{ValidationErrors, ValidationErrorsKind};

use super::app_error::ValidationIssue;

/// Flattens nested validator output into `field.path[index]` issues, sorted by field then code.
pub(super) fn validation_issues(errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut pending: Vec<(Option<String>, &ValidationErrors)> = vec![(None, errors)];

    while let Some((prefix, errors)) = pending.pop() {
        for (field, kind) in errors.errors() {
            let path = match &prefix {
                Some(prefix) => format!("{prefix}.{field}"),
                None => field.to_string(),
            };

            match kind {
                ValidationErrorsKind::Field(field_errors) => {
                    issues.extend(field_errors.iter().map(|error| ValidationIssue {
                        field: path.clone(),
                        message: error
                            .message
                            .as_ref()
                            .map(std::borrow::Cow::to_string)
                            .unwrap_or_else(|| format!("{path} is invalid")),
                        code: error.code.to_string(),
                    }));
                }
                ValidationErrorsKind::Struct(nested) => {
                    pending.push((Some(path), nested.as_ref()));
                }
                ValidationErrorsKind::List(items) => {
                    for (index, nested) in items {
                        pending.push((Some(format!("{path}[{index}]")), nested.as_ref()));
                    }
                }
            }
        }
    }

    issues.sort_by(|left, right| {
        left.field
            .cmp(&right.field)
            .then(left.code.cmp(&right.code))
    });
    issues
}
