use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a new top-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopupRequest {
    pub user_id: Uuid,
    pub amount: i64,
    pub method: Option<String>,
}

impl CreateTopupRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.amount <= 0 {
            errors.push(ValidationError { field: "amount".to_string(), message: "amount must be positive".to_string() });
        }
        if let Some(method) = self.method.as_deref() {
            if method.trim().is_empty() {
                errors.push(ValidationError { field: "method".to_string(), message: "method cannot be empty".to_string() });
            } else if method.len() > 32 {
                errors.push(ValidationError { field: "method".to_string(), message: "method must be at most 32 characters".to_string() });
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_topup_request_validation() {
        let valid_request = CreateTopupRequest {
            user_id: Uuid::new_v4(),
            amount: 50_000,
            method: Some("VIRTUAL_ACCOUNT".to_string()),
        };
        assert!(valid_request.validate().is_ok());

        let no_method = CreateTopupRequest {
            user_id: Uuid::new_v4(),
            amount: 50_000,
            method: None,
        };
        assert!(no_method.validate().is_ok());

        let invalid_amount = CreateTopupRequest {
            user_id: Uuid::new_v4(),
            amount: 0,
            method: None,
        };
        let errors = invalid_amount.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "amount");
    }

    #[test]
    fn test_create_topup_request_method_bounds() {
        let blank_method = CreateTopupRequest {
            user_id: Uuid::new_v4(),
            amount: 1_000,
            method: Some("   ".to_string()),
        };
        assert!(blank_method.validate().is_err());

        let long_method = CreateTopupRequest {
            user_id: Uuid::new_v4(),
            amount: 1_000,
            method: Some("X".repeat(33)),
        };
        assert!(long_method.validate().is_err());
    }
}
