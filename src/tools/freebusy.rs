//! Free/busy lookup across calendars

use chrono::DateTime;
use serde::Deserialize;

use crate::error::{CalendarError, Result};
use crate::google::CalendarApi;
use crate::types::{FreeBusyItem, FreeBusyRequest, FreeBusyResponse};

fn default_calendar_ids() -> Vec<String> {
    vec!["primary".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyArgs {
    pub time_min: String,
    pub time_max: String,
    #[serde(default = "default_calendar_ids")]
    pub calendar_ids: Vec<String>,
    pub time_zone: Option<String>,
}

/// Busy periods per calendar; calendars the service could not read carry
/// their `errors` instead
pub async fn get_freebusy(api: &dyn CalendarApi, args: FreeBusyArgs) -> Result<FreeBusyResponse> {
    let min = DateTime::parse_from_rfc3339(&args.time_min).map_err(|e| {
        CalendarError::InvalidArgument(format!("timeMin '{}' is not RFC 3339: {e}", args.time_min))
    })?;
    let max = DateTime::parse_from_rfc3339(&args.time_max).map_err(|e| {
        CalendarError::InvalidArgument(format!("timeMax '{}' is not RFC 3339: {e}", args.time_max))
    })?;
    if max <= min {
        return Err(CalendarError::InvalidArgument(
            "timeMax must be later than timeMin".to_string(),
        ));
    }

    let items: Vec<FreeBusyItem> = args
        .calendar_ids
        .into_iter()
        .filter(|id| !id.trim().is_empty())
        .map(|id| FreeBusyItem { id })
        .collect();
    if items.is_empty() {
        return Err(CalendarError::InvalidArgument(
            "calendarIds must name at least one calendar".to_string(),
        ));
    }

    let request = FreeBusyRequest {
        time_min: args.time_min,
        time_max: args.time_max,
        time_zone: args.time_zone,
        items,
    };
    let mut response = api.query_freebusy(&request).await?;

    for (id, calendar) in &response.calendars {
        for error in &calendar.errors {
            tracing::warn!(calendar_id = %id, reason = %error.reason, "free/busy unavailable");
        }
    }
    response.time_min = request.time_min;
    response.time_max = request.time_max;
    Ok(response)
}
