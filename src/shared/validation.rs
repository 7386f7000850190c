//! Validation Utilities

use serde::Deserialize;
use serde_json::{Map, Value};
use validator::ValidationErrors;

use super::error::AppError;

/// Flatten `validator` field errors into `{"field": ["message", ...]}`.
pub fn field_errors(errors: &ValidationErrors) -> Value {
    let mut fields = Map::new();

    for (field, errs) in errors.field_errors() {
        let messages: Vec<Value> = errs
            .iter()
            .map(|e| {
                e.message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
                    .into()
            })
            .collect();
        fields.insert(field.to_string(), Value::Array(messages));
    }

    Value::Object(fields)
}

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    AppError::from(errors)
}

/// Page-number pagination (`?page=&page_size=`).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageParams {
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Reject out-of-range values.
    pub fn validate(self) -> Result<Self, AppError> {
        if self.page < 1 {
            return Err(AppError::validation_with(
                "Page must be at least 1",
                serde_json::json!({ "page": self.page }),
            ));
        }
        if !(1..=Self::MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(AppError::validation_with(
                format!("Page size must be between 1 and {}", Self::MAX_PAGE_SIZE),
                serde_json::json!({ "page_size": self.page_size }),
            ));
        }
        if self.checked_offset().is_none() {
            return Err(AppError::validation_with(
                "Page is out of range",
                serde_json::json!({ "page": self.page }),
            ));
        }
        Ok(self)
    }

    fn checked_offset(&self) -> Option<i64> {
        self.page.checked_sub(1)?.checked_mul(self.page_size)
    }

    /// Row offset of the page; saturates for values `validate` rejects.
    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX)
    }
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Check that `limit` falls within `1..=max`.
pub fn check_limit(limit: i64, max: i64) -> Result<i64, AppError> {
    if (1..=max).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::validation_with(
            format!("Limit must be between 1 and {}", max),
            serde_json::json!({ "limit": limit }),
        ))
    }
}
