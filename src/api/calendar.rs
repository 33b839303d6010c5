use crate::{
    error::{AppError, ErrorBody},
    model::{RequestView, StatusLabel},
    service::{AppState, requests},
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    #[schema(example = 2025)]
    /// Only days in this year
    pub year: Option<i32>,
    #[schema(example = "Approved")]
    /// Only requests with this status label
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "days": {
        "2025-11-11": [{"id": "req-kayley", "status": "Pending", "type": "PTO"}],
        "2025-11-12": [{"id": "req-kayley", "status": "Pending", "type": "PTO"}]
    }
}))]
pub struct CalendarResponse {
    /// `YYYY-MM-DD` → requests covering that day
    pub days: BTreeMap<String, Vec<RequestView>>,
}

/// Requests bucketed per covered day.
#[utoipa::path(
    get,
    path = "/api/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Day index", body = CalendarResponse),
        (status = 400, description = "Unknown status filter", body = ErrorBody)
    ),
    tag = "Calendar"
)]
pub async fn calendar(
    state: web::Data<AppState>,
    query: web::Query<CalendarQuery>,
) -> actix_web::Result<impl Responder> {
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            StatusLabel::from_str(raw).map_err(|_| {
                AppError::Validation("Status must be Pending, Approved or Denied.".into())
            })
        })
        .transpose()?;

    let filter = requests::CalendarFilter {
        year: query.year,
        status,
    };
    let days = requests::calendar(&state, filter)
        .await?
        .into_iter()
        .map(|(day, views)| (day.format("%Y-%m-%d").to_string(), views))
        .collect();

    Ok(HttpResponse::Ok().json(CalendarResponse { days }))
}
