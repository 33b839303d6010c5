use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::status::{RequestStatus, StatusLabel};
use crate::utils::calendar::DateSpan;

pub const UNKNOWN_EMPLOYEE_NAME: &str = "Unknown employee";
pub const DEFAULT_ROLE_LABEL: &str = "Team Member";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOffRequest {
    pub id: String,
    /// may dangle once the employee row is gone
    pub employee_id: Option<String>,
    pub external_user_id: String,
    pub status: RequestStatus,
    pub request_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Option<i32>,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

/// A request joined with whatever is left of its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestWithEmployee {
    pub request: TimeOffRequest,
    pub employee_name: Option<String>,
    pub employee_role: Option<String>,
}

/// Raw, unvalidated submission fields.
#[derive(Debug, Clone, Default)]
pub struct RequestDraft<'a> {
    pub request_type: &'a str,
    pub start_date: &'a str,
    pub end_date: Option<&'a str>,
    pub hours: Option<f64>,
    pub note: Option<&'a str>,
}

/// Submission fields that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub request_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Option<i32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTimeOffRequest {
    pub employee_id: Option<String>,
    pub external_user_id: String,
    pub request_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Option<i32>,
    pub note: Option<String>,
}

impl NewTimeOffRequest {
    pub fn from_draft(
        employee_id: Option<String>,
        external_user_id: impl Into<String>,
        draft: ValidatedDraft,
    ) -> Self {
        Self {
            employee_id,
            external_user_id: external_user_id.into(),
            request_type: draft.request_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            hours: draft.hours,
            note: draft.note,
        }
    }

    /// Materialize a pending request as of `now`.
    pub fn into_request(self, id: String, now: DateTime<Utc>) -> TimeOffRequest {
        TimeOffRequest {
            id,
            employee_id: self.employee_id,
            external_user_id: self.external_user_id,
            status: RequestStatus::Pending,
            request_type: self.request_type,
            start_date: self.start_date,
            end_date: self.end_date,
            hours: self.hours,
            note: self.note,
            submitted_at: now,
            last_updated_at: now,
            metadata: None,
        }
    }
}

/// Strict `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Longest request, in days, counting both ends.
pub const MAX_SPAN_DAYS: i64 = 366;
/// Width of the `request_type` column.
pub const MAX_REQUEST_TYPE_CHARS: usize = 50;
pub const MAX_NOTE_CHARS: usize = 2000;

fn validate_hours(hours: f64) -> Result<i32, AppError> {
    if !hours.is_finite() {
        return Err(AppError::Validation("Hours must be a number.".into()));
    }
    if hours <= 0.0 {
        return Err(AppError::Validation(
            "Hours must be greater than zero.".into(),
        ));
    }
    if hours.fract() != 0.0 || hours > f64::from(i32::MAX) {
        return Err(AppError::Validation("Hours must be a whole number.".into()));
    }
    Ok(hours as i32)
}

impl RequestDraft<'_> {
    pub fn validate(&self) -> Result<ValidatedDraft, AppError> {
        let start_raw = self.start_date.trim();
        if start_raw.is_empty() {
            return Err(AppError::Validation("Start date is required.".into()));
        }
        let start_date = parse_iso_date(start_raw)
            .ok_or_else(|| AppError::Validation("Start date must be a valid date.".into()))?;

        let request_type = self.request_type.trim();
        if request_type.is_empty() {
            return Err(AppError::Validation("Request type is required.".into()));
        }
        if request_type.chars().count() > MAX_REQUEST_TYPE_CHARS {
            return Err(AppError::Validation(format!(
                "Request type must be at most {MAX_REQUEST_TYPE_CHARS} characters."
            )));
        }

        let hours = self.hours.map(validate_hours).transpose()?;

        // a blank end date means a single-day request
        let end_date = match self.end_date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_iso_date(raw)
                .ok_or_else(|| AppError::Validation("End date must be a valid date.".into()))?,
            None => start_date,
        };
        if end_date < start_date {
            return Err(AppError::Validation(
                "End date cannot be before the start date.".into(),
            ));
        }
        if (end_date - start_date).num_days() + 1 > MAX_SPAN_DAYS {
            return Err(AppError::Validation(format!(
                "Requests cannot cover more than {MAX_SPAN_DAYS} days."
            )));
        }

        let note = self
            .note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_CHARS) {
            return Err(AppError::Validation(format!(
                "Note must be at most {MAX_NOTE_CHARS} characters."
            )));
        }

        Ok(ValidatedDraft {
            request_type: request_type.to_string(),
            start_date,
            end_date,
            hours,
            note,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    #[schema(nullable = true)]
    pub id: Option<String>,
    #[schema(example = "user_2abc")]
    pub external_id: String,
    #[schema(example = "Kayley Manfredi")]
    pub name: String,
    #[schema(example = "Employee")]
    pub role: String,
}

/// Denormalized request as returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "req-kayley",
    "status": "Pending",
    "type": "PTO",
    "startDate": "2025-11-11",
    "endDate": "2025-11-12",
    "hours": 8,
    "submittedAt": "2025-10-23T15:04:05.000Z",
    "employee": {
        "id": "emp-kayley",
        "externalId": "user_kayley",
        "name": "Kayley Manfredi",
        "role": "Employee"
    }
}))]
pub struct RequestView {
    pub id: String,
    pub status: StatusLabel,
    #[serde(rename = "type")]
    pub request_type: String,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hours: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    #[schema(format = "date-time")]
    pub submitted_at: String,
    pub employee: EmployeeSummary,
}

impl From<&RequestWithEmployee> for RequestView {
    fn from(row: &RequestWithEmployee) -> Self {
        let request = &row.request;
        RequestView {
            id: request.id.clone(),
            status: request.status.label(),
            request_type: request.request_type.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            hours: request.hours,
            note: request.note.clone(),
            submitted_at: request
                .submitted_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            employee: EmployeeSummary {
                id: request.employee_id.clone(),
                external_id: request.external_user_id.clone(),
                name: row
                    .employee_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_EMPLOYEE_NAME.to_string()),
                role: row
                    .employee_role
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ROLE_LABEL.to_string()),
            },
        }
    }
}

impl DateSpan for RequestView {
    fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft<'a>(start: &'a str, end: Option<&'a str>, hours: Option<f64>) -> RequestDraft<'a> {
        RequestDraft {
            request_type: "PTO",
            start_date: start,
            end_date: end,
            hours,
            note: Some("  family trip  "),
        }
    }

    #[test]
    fn valid_draft_is_normalized() {
        let validated = draft("2025-11-11", Some("2025-11-12"), Some(8.0))
            .validate()
            .unwrap();
        assert_eq!(validated.start_date, NaiveDate::from_ymd_opt(2025, 11, 11).unwrap());
        assert_eq!(validated.end_date, NaiveDate::from_ymd_opt(2025, 11, 12).unwrap());
        assert_eq!(validated.hours, Some(8));
        assert_eq!(validated.note.as_deref(), Some("family trip"));
    }

    #[test]
    fn blank_end_date_defaults_to_start() {
        let validated = draft("2025-11-11", Some(""), None).validate().unwrap();
        assert_eq!(validated.end_date, validated.start_date);
        assert_eq!(validated.hours, None);
    }

    #[rstest]
    #[case(draft("", None, None), "Start date is required.")]
    #[case(draft("2025-02-30", None, None), "Start date must be a valid date.")]
    #[case(draft("2025-2-3", None, None), "Start date must be a valid date.")]
    #[case(draft("2025-11-12", Some("2025-11-11"), None), "End date cannot be before the start date.")]
    #[case(draft("2025-11-12", Some("tomorrow"), None), "End date must be a valid date.")]
    #[case(draft("2025-11-12", None, Some(0.0)), "Hours must be greater than zero.")]
    #[case(draft("2025-11-12", None, Some(-4.0)), "Hours must be greater than zero.")]
    #[case(draft("2025-11-12", None, Some(7.5)), "Hours must be a whole number.")]
    #[case(draft("2025-01-01", Some("2026-01-02"), None), "Requests cannot cover more than 366 days.")]
    #[case(draft("0001-01-01", Some("9999-12-31"), None), "Requests cannot cover more than 366 days.")]
    fn invalid_drafts_are_rejected(#[case] input: RequestDraft<'static>, #[case] message: &str) {
        match input.validate() {
            Err(AppError::Validation(actual)) => assert_eq!(actual, message),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn a_full_leap_year_is_the_longest_request() {
        let validated = draft("2024-01-01", Some("2024-12-31"), None).validate().unwrap();
        assert_eq!((validated.end_date - validated.start_date).num_days() + 1, MAX_SPAN_DAYS);
    }

    #[test]
    fn text_fields_must_fit_their_columns() {
        let request_type = "x".repeat(MAX_REQUEST_TYPE_CHARS + 1);
        let long_type = RequestDraft {
            request_type: &request_type,
            ..draft("2025-11-11", None, None)
        };
        assert!(matches!(
            long_type.validate(),
            Err(AppError::Validation(m)) if m == "Request type must be at most 50 characters."
        ));

        let note = "é".repeat(MAX_NOTE_CHARS + 1);
        let long_note = RequestDraft {
            note: Some(&note),
            ..draft("2025-11-11", None, None)
        };
        assert!(matches!(
            long_note.validate(),
            Err(AppError::Validation(m)) if m == "Note must be at most 2000 characters."
        ));

        // surrounding whitespace does not count
        let padded = format!("  {}  ", "é".repeat(MAX_NOTE_CHARS));
        let fits = RequestDraft {
            note: Some(&padded),
            ..draft("2025-11-11", None, None)
        };
        assert!(fits.validate().is_ok());
    }

    #[test]
    fn view_uses_placeholders_for_missing_employee() {
        let now = Utc::now();
        let request = NewTimeOffRequest::from_draft(
            None,
            "user_gone",
            draft("2025-11-11", None, None).validate().unwrap(),
        )
        .into_request("req-1".into(), now);
        let view = RequestView::from(&RequestWithEmployee {
            request,
            employee_name: None,
            employee_role: None,
        });

        assert_eq!(view.status, StatusLabel::Pending);
        assert_eq!(view.employee.name, UNKNOWN_EMPLOYEE_NAME);
        assert_eq!(view.employee.role, DEFAULT_ROLE_LABEL);
        assert_eq!(view.employee.external_id, "user_gone");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "PTO");
        assert_eq!(json["startDate"], "2025-11-11");
        assert!(json.get("hours").is_none());
    }
}
