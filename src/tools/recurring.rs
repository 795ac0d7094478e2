//! Scoped edits and single-occurrence deletes of recurring events

use serde::{Deserialize, Serialize};

use super::{default_calendar_id, require_id};
use crate::error::Result;
use crate::google::CalendarApi;
use crate::recurrence::{
    delete_instance, update_scoped, EditScope, EventUpdate, OccurrenceLocator, ScopedUpdate,
};
use crate::types::{EventDateTime, SendUpdates};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecurringArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// Id of the series master
    pub event_id: String,
    pub scope: EditScope,
    pub instance_date: Option<String>,
    pub instance_date_time: Option<String>,
    #[serde(flatten)]
    pub update: EventUpdate,
}

/// Result of a scoped update, tagged with the applied scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedUpdateOutput {
    pub scope: EditScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_recurrence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub message: String,
}

impl From<ScopedUpdate> for ScopedUpdateOutput {
    fn from(result: ScopedUpdate) -> Self {
        let scope = result.scope();
        match result {
            ScopedUpdate::SingleInstance { instance_id, event } => Self {
                scope,
                id: event.id.or(Some(instance_id)),
                original_event_id: None,
                new_event_id: None,
                truncated_recurrence: None,
                summary: event.summary,
                start: event.start,
                end: event.end,
                recurrence: None,
                updated: event.updated,
                message: "Updated this occurrence only".to_string(),
            },
            ScopedUpdate::EntireSeries { series_id, event } => Self {
                scope,
                id: event.id.or(Some(series_id)),
                original_event_id: None,
                new_event_id: None,
                truncated_recurrence: None,
                summary: event.summary,
                start: event.start,
                end: event.end,
                recurrence: event.recurrence,
                updated: event.updated,
                message: "Updated all occurrences of the series".to_string(),
            },
            ScopedUpdate::ThisAndFollowing(split) => Self {
                scope,
                id: None,
                original_event_id: Some(split.original_series_id),
                new_event_id: Some(split.new_series_id),
                truncated_recurrence: Some(split.truncated_recurrence),
                summary: split.continuation.summary,
                start: split.continuation.start,
                end: split.continuation.end,
                recurrence: None,
                updated: None,
                message: "Updated this and following occurrences (the series was split and a new \
                          recurring event now covers the rest)"
                    .to_string(),
            },
        }
    }
}

pub async fn update_recurring_event(
    api: &dyn CalendarApi,
    args: UpdateRecurringArgs,
) -> Result<ScopedUpdateOutput> {
    let series_id = require_id("eventId", &args.event_id)?;
    if let Some(start) = &args.update.start {
        start.validate("start")?;
    }
    if let Some(end) = &args.update.end {
        end.validate("end")?;
    }
    let locator = OccurrenceLocator::parse(
        args.instance_date.as_deref(),
        args.instance_date_time.as_deref(),
    )?;

    let result = update_scoped(
        api,
        &args.calendar_id,
        series_id,
        args.scope,
        locator.as_ref(),
        &args.update,
    )
    .await?;
    Ok(result.into())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteInstanceArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub event_id: String,
    pub instance_date: Option<String>,
    pub instance_date_time: Option<String>,
    #[serde(default)]
    pub send_updates: SendUpdates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteInstanceOutput {
    pub success: bool,
    pub deleted_instance_id: String,
    pub message: String,
}

pub async fn delete_recurring_instance(
    api: &dyn CalendarApi,
    args: DeleteInstanceArgs,
) -> Result<DeleteInstanceOutput> {
    let locator = OccurrenceLocator::parse(
        args.instance_date.as_deref(),
        args.instance_date_time.as_deref(),
    )?;
    let deleted = delete_instance(
        api,
        &args.calendar_id,
        &args.event_id,
        locator.as_ref(),
        args.send_updates,
    )
    .await?;

    let when = locator.map(|l| l.to_string()).unwrap_or_default();
    Ok(DeleteInstanceOutput {
        success: true,
        deleted_instance_id: deleted.api_id(),
        message: format!(
            "Deleted the {when} occurrence of recurring event {}",
            deleted.series_id()
        ),
    })
}
