//! Institution form

use super::fields;
use super::FieldErrors;
use crate::config::{EMAIL_MAX_LENGTH, INSTITUTION_NAME_MAX_LENGTH, INSTITUTION_REGION_MAX_LENGTH};
use crate::database::InstitutionFields;
use serde_json::Value;

pub struct InstitutionForm;

impl InstitutionForm {
    pub fn validate(data: &Value) -> Result<InstitutionFields, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = fields::text(
            data,
            "name",
            true,
            Some(INSTITUTION_NAME_MAX_LENGTH),
            &mut errors,
        );
        let region = fields::optional_text(
            data,
            "region",
            Some(INSTITUTION_REGION_MAX_LENGTH),
            &mut errors,
        );
        let email = fields::optional_text(data, "email", Some(EMAIL_MAX_LENGTH), &mut errors);

        if let Some(email) = &email {
            let valid = email
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if !valid {
                errors.add("email", "Enter a valid email address.");
            }
        }

        errors.into_result(InstitutionFields {
            name,
            region,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_institution() {
        let fields = InstitutionForm::validate(&json!({
            "name": "Gmina Kraków",
            "region": "małopolskie",
            "email": "urzad@krakow.pl",
        }))
        .unwrap();

        assert_eq!(fields.name, "Gmina Kraków");
        assert_eq!(fields.email.as_deref(), Some("urzad@krakow.pl"));
    }

    #[test]
    fn test_invalid_email() {
        let errors = InstitutionForm::validate(&json!({"name": "X", "email": "not-an-address"}))
            .unwrap_err();
        assert_eq!(errors.message("email"), Some("Enter a valid email address."));
    }

    #[test]
    fn test_region_and_email_limits() {
        let long_region = "r".repeat(INSTITUTION_REGION_MAX_LENGTH + 1);
        let long_email = format!("{}@example.org", "a".repeat(EMAIL_MAX_LENGTH));
        let errors = InstitutionForm::validate(
            &json!({"name": "X", "region": long_region, "email": long_email}),
        )
        .unwrap_err();

        assert!(errors.message("region").is_some());
        assert!(errors.message("email").is_some());
    }
}
