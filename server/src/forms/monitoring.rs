//! Monitoring form

use super::fields;
use super::FieldErrors;
use crate::config::MONITORING_NAME_MAX_LENGTH;
use crate::database::{MonitoringFields, NewMonitoring};
use crate::sanitize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct MonitoringForm {
    pub fields: MonitoringFields,
    /// Slugs of institutions to assign on creation
    pub institutions: Vec<String>,
}

impl MonitoringForm {
    pub fn validate(data: &Value) -> Result<MonitoringForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = fields::text(
            data,
            "name",
            true,
            Some(MONITORING_NAME_MAX_LENGTH),
            &mut errors,
        );
        let description = fields::text(data, "description", true, None, &mut errors);
        let instruction = fields::text(data, "instruction", false, None, &mut errors);
        let active = fields::boolean(data, "active");
        let max_point = fields::integer(data, "max_point", true, None, &mut errors);
        let logo = fields::optional_text(data, "logo", None, &mut errors);
        let institutions = fields::string_list(data, "institutions", &mut errors);

        let description = sanitize::clean(&description);
        if description.trim().is_empty() && !errors.contains("description") {
            errors.add("description", fields::REQUIRED);
        }

        let form = MonitoringForm {
            fields: MonitoringFields {
                name,
                description,
                instruction: sanitize::clean(&instruction),
                active,
                max_point: max_point.unwrap_or_default(),
                logo,
            },
            institutions,
        };

        errors.into_result(form)
    }

    /// Attach the owning user
    pub fn bind(&self, user_id: i64) -> NewMonitoring {
        NewMonitoring {
            user_id,
            fields: self.fields.clone(),
        }
    }
}
