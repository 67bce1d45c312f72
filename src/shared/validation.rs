//! Validation Utilities

use validator::ValidationErrors;

use super::error::{AppError, FieldError};

/// Convert validation errors to AppError, keeping every failed field in the
/// message so a client fixing one problem learns about the others too.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
            })
        })
        .collect();

    if field_errors.is_empty() {
        return AppError::Validation("Validation failed".into());
    }

    let message = field_errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    AppError::Validation(message)
}
