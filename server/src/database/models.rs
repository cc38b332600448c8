//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// An authenticated account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

/// A questionnaire template owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Monitoring {
    pub id: i64,
    pub name: String,
    /// Derived from the name at creation, never changes afterwards
    pub slug: String,
    pub user_id: i64,
    /// Sanitized rich text
    pub description: String,
    /// Sanitized rich text, may be empty
    pub instruction: String,
    pub active: bool,
    pub max_point: i64,
    /// Opaque reference to a stored logo image
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Monitoring {
    pub fn absolute_url(&self) -> String {
        format!("/monitorings/{}", self.slug)
    }

    /// Progress of one institution within this monitoring
    pub fn institution_url(&self, institution: &Institution) -> String {
        format!("/monitorings/{}/institutions/{}", self.slug, institution.slug)
    }

    pub fn answer_url(&self, institution: &Institution) -> String {
        format!("{}/answer", self.institution_url(institution))
    }
}

/// Editable monitoring fields, shared by creation and update
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringFields {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub active: bool,
    pub max_point: i64,
    pub logo: Option<String>,
}

/// Monitoring ready for insertion
#[derive(Debug, Clone)]
pub struct NewMonitoring {
    pub user_id: i64,
    pub fields: MonitoringFields,
}

/// Monitoring row for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonitoringSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub monitoring: Monitoring,
    pub owner: String,
    /// Whether any answer sheet was submitted
    pub started: bool,
}

/// An institution that monitorings can be assigned to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Institution {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub region: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Institution {
    pub fn absolute_url(&self) -> String {
        format!("/institutions/{}", self.slug)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionFields {
    pub name: String,
    pub region: Option<String>,
    pub email: Option<String>,
}

/// Assignment of a monitoring to an institution
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonitoringInstitution {
    pub id: i64,
    pub monitoring_id: i64,
    pub institution_id: i64,
}

/// A resolved assignment with both sides loaded
#[derive(Debug, Clone)]
pub struct Assignment {
    pub link: MonitoringInstitution,
    pub monitoring: Monitoring,
    pub institution: Institution,
}

/// Assigned institution with its submitted sheet count
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InstitutionProgress {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub institution: Institution,
    pub sheet_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionType {
    ShortText,
    LongText,
    Choice,
}

impl QuestionType {
    pub const ALL: [&'static str; 3] = ["short_text", "long_text", "choice"];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ShortText => "short_text",
            QuestionType::LongText => "long_text",
            QuestionType::Choice => "choice",
        }
    }

    pub fn parse(tag: &str) -> Option<QuestionType> {
        match tag {
            "short_text" => Some(QuestionType::ShortText),
            "long_text" => Some(QuestionType::LongText),
            "choice" => Some(QuestionType::Choice),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub monitoring_id: i64,
    pub name: String,
    pub description: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Points the question is worth
    pub count: i64,
    #[serde(rename = "order")]
    pub position: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub monitoring_id: i64,
    pub created_by: i64,
    pub position: i64,
    pub name: String,
    pub description: String,
    pub kind: QuestionType,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub key: String,
    pub value: String,
    #[serde(rename = "order")]
    pub position: i64,
}

#[derive(Debug, Clone)]
pub struct NewChoice {
    pub question_id: i64,
    pub position: i64,
    pub key: String,
    pub value: String,
}

/// Hides `related` depending on the answer given to `target`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Condition {
    pub id: i64,
    pub related_id: i64,
    pub target_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct NewCondition {
    pub related_id: i64,
    pub target_id: i64,
    pub kind: String,
    pub value: String,
}

/// Question with its choices and hide conditions, for detail views
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<Choice>,
    #[serde(rename = "hideConditions")]
    pub hide_conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringDetail {
    #[serde(flatten)]
    pub monitoring: Monitoring,
    pub owner: String,
    pub url: String,
    pub questions: Vec<QuestionDetail>,
    pub institutions: Vec<Institution>,
}

/// One respondent's answer session for a monitoring
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sheet {
    pub id: i64,
    pub monitoring_id: i64,
    pub monitoring_institution_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SheetSummary {
    pub id: i64,
    pub username: String,
    pub answer_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A validated answer ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Text(String),
    /// Id of the selected choice
    Choice(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: i64,
    pub sheet_id: i64,
    pub question_id: i64,
}
