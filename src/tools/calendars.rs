//! Calendar list, calendar metadata and color palettes

use serde::{Deserialize, Serialize};

use super::{default_calendar_id, require_id};
use crate::error::Result;
use crate::google::CalendarApi;
use crate::types::{Calendar, CalendarListEntry, Colors};

#[derive(Debug, Clone, Serialize)]
pub struct CalendarListOutput {
    pub calendars: Vec<CalendarListEntry>,
}

pub async fn list_calendars(api: &dyn CalendarApi) -> Result<CalendarListOutput> {
    let calendars = api.list_calendars().await?;
    tracing::debug!("listed {} calendars", calendars.len());
    Ok(CalendarListOutput { calendars })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCalendarArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

pub async fn get_calendar(api: &dyn CalendarApi, args: GetCalendarArgs) -> Result<Calendar> {
    api.get_calendar(require_id("calendarId", &args.calendar_id)?)
        .await
}

pub async fn list_colors(api: &dyn CalendarApi) -> Result<Colors> {
    api.get_colors().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::InMemoryCalendar;

    #[tokio::test]
    async fn test_list_calendars_includes_added() {
        let api = InMemoryCalendar::new().with_calendar(CalendarListEntry {
            id: "team@group.calendar.google.com".to_string(),
            summary: Some("Team".to_string()),
            access_role: Some("reader".to_string()),
            ..Default::default()
        });
        let out = list_calendars(&api).await.unwrap();
        assert_eq!(out.calendars.len(), 2);
        assert!(out
            .calendars
            .iter()
            .any(|c| c.id == "primary" && c.primary == Some(true)));
    }

    #[tokio::test]
    async fn test_get_unknown_calendar_is_remote_not_found() {
        let api = InMemoryCalendar::new();
        let err = get_calendar(
            &api,
            GetCalendarArgs {
                calendar_id: "nope".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.user_message().starts_with("The requested resource was not found"));
    }

    #[tokio::test]
    async fn test_colors_have_event_palette() {
        let api = InMemoryCalendar::new();
        let colors = list_colors(&api).await.unwrap();
        assert!(!colors.event.is_empty());
        assert!(!colors.calendar.is_empty());
    }
}
