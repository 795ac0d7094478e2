//! Scoped edits of recurring events
//!
//! An edit of a series applies to one occurrence, to the whole series, or to
//! an occurrence and everything after it. The last case is a two-write saga:
//!
//! 1. patch the original series so its rules end the day before the split
//! 2. insert a continuation series starting at the split occurrence
//!
//! Nothing is rolled back. If step 2 fails the original stays truncated and
//! the caller gets [`CalendarError::PartialSplit`] carrying the rules that
//! were installed, so the state can be reconciled by hand. Concurrent splits
//! of the same series are not arbitrated.

use chrono::{Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::instance::{instance_ref, EventRef, OccurrenceLocator};
use super::rrule::{strip_bounds, truncate_before};
use crate::error::{CalendarError, RemoteOperation, Result};
use crate::google::CalendarApi;
use crate::types::{Event, EventBody, EventDateTime, SendUpdates};

/// Breadth of an edit against a recurring series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditScope {
    #[serde(rename = "thisEventOnly", alias = "single-instance")]
    SingleInstance,
    #[serde(rename = "all", alias = "entire-series")]
    EntireSeries,
    #[serde(rename = "thisAndFollowing", alias = "this-and-following")]
    ThisAndFollowing,
}

impl EditScope {
    pub fn as_str(self) -> &'static str {
        match self {
            EditScope::SingleInstance => "thisEventOnly",
            EditScope::EntireSeries => "all",
            EditScope::ThisAndFollowing => "thisAndFollowing",
        }
    }
}

/// Property changes requested for a series or occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    pub color_id: Option<String>,
}

impl EventUpdate {
    /// Patch body carrying exactly the requested fields
    pub fn to_patch(&self) -> EventBody {
        EventBody {
            summary: self.summary.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            color_id: self.color_id.clone(),
            ..Default::default()
        }
    }
}

/// A completed split of one series into two
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSplit {
    pub original_series_id: String,
    /// Rules installed on the original series
    pub truncated_recurrence: Vec<String>,
    /// Id of the series covering the split date onward
    pub new_series_id: String,
    pub continuation: Event,
}

/// Outcome of [`update_scoped`], tagged by the scope that was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopedUpdate {
    SingleInstance { instance_id: String, event: Event },
    EntireSeries { series_id: String, event: Event },
    ThisAndFollowing(SeriesSplit),
}

impl ScopedUpdate {
    pub fn scope(&self) -> EditScope {
        match self {
            ScopedUpdate::SingleInstance { .. } => EditScope::SingleInstance,
            ScopedUpdate::EntireSeries { .. } => EditScope::EntireSeries,
            ScopedUpdate::ThisAndFollowing(_) => EditScope::ThisAndFollowing,
        }
    }
}

/// Apply `update` to a recurring series with the given scope
pub async fn update_scoped(
    api: &dyn CalendarApi,
    calendar_id: &str,
    series_id: &str,
    scope: EditScope,
    locator: Option<&OccurrenceLocator>,
    update: &EventUpdate,
) -> Result<ScopedUpdate> {
    match scope {
        EditScope::SingleInstance => {
            let target = instance_ref(series_id, locator)?;
            tracing::info!(calendar_id, instance = %target, "updating single occurrence");
            let event = api
                .patch_event(calendar_id, &target, &update.to_patch())
                .await?;
            Ok(ScopedUpdate::SingleInstance {
                instance_id: target.api_id(),
                event,
            })
        }
        EditScope::EntireSeries => {
            let target = EventRef::event(series_id);
            tracing::info!(calendar_id, series_id, "updating entire series");
            let event = api
                .patch_event(calendar_id, &target, &update.to_patch())
                .await?;
            Ok(ScopedUpdate::EntireSeries {
                series_id: series_id.to_string(),
                event,
            })
        }
        EditScope::ThisAndFollowing => {
            split_series(api, calendar_id, series_id, locator, update)
                .await
                .map(ScopedUpdate::ThisAndFollowing)
        }
    }
}

async fn split_series(
    api: &dyn CalendarApi,
    calendar_id: &str,
    series_id: &str,
    locator: Option<&OccurrenceLocator>,
    update: &EventUpdate,
) -> Result<SeriesSplit> {
    let series_ref = EventRef::event(series_id);
    let original = api
        .get_event(calendar_id, &series_ref)
        .await
        .map_err(|e| e.during(RemoteOperation::FetchEvent))?;
    if !original.is_recurring() {
        return Err(CalendarError::NotRecurring(format!(
            "event {series_id} has no recurrence rules"
        )));
    }

    let locator = OccurrenceLocator::required(locator)?;
    let body = continuation_body(&original, locator, update);
    check_span(&body)?;

    let split_date = locator.split_date();
    let truncated = truncate_before(original.recurrence_rules(), split_date);

    tracing::info!(calendar_id, series_id, %split_date, "truncating series before split");
    api.patch_event(
        calendar_id,
        &series_ref,
        &EventBody {
            recurrence: Some(truncated.clone()),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.during(RemoteOperation::TruncateSeries))?;

    let continuation = match api.insert_event(calendar_id, &body).await {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(
                calendar_id,
                series_id,
                "series truncated but continuation insert failed: {}",
                e
            );
            return Err(CalendarError::PartialSplit {
                series_id: series_id.to_string(),
                truncated_recurrence: truncated,
                source: Box::new(e.during(RemoteOperation::InsertContinuation)),
            });
        }
    };

    let new_series_id = continuation.id.clone().unwrap_or_default();
    tracing::info!(calendar_id, series_id, new_series_id = %new_series_id, "series split");
    Ok(SeriesSplit {
        original_series_id: series_id.to_string(),
        truncated_recurrence: truncated,
        new_series_id,
        continuation,
    })
}

/// Insert body for the series that takes over from the split occurrence
pub fn continuation_body(
    original: &Event,
    locator: &OccurrenceLocator,
    update: &EventUpdate,
) -> EventBody {
    let start = update
        .start
        .clone()
        .unwrap_or_else(|| anchor_start(original, locator));
    let end = update
        .end
        .clone()
        .or_else(|| shifted_end(original, &start));

    EventBody {
        summary: update.summary.clone().or_else(|| original.summary.clone()),
        description: update
            .description
            .clone()
            .or_else(|| original.description.clone()),
        location: update.location.clone().or_else(|| original.location.clone()),
        start: Some(start),
        end,
        attendees: original.attendees.clone(),
        recurrence: Some(strip_bounds(original.recurrence_rules())),
        reminders: original.reminders.clone(),
        color_id: update.color_id.clone().or_else(|| original.color_id.clone()),
        visibility: original.visibility,
        transparency: original.transparency,
    }
}

/// Reject a continuation the API would refuse: it needs both bounds, of the
/// same kind, with the end after the start.
fn check_span(body: &EventBody) -> Result<()> {
    let (Some(start), Some(end)) = (&body.start, &body.end) else {
        return Err(CalendarError::InvalidArgument(
            "cannot derive an end for the new series; pass end explicitly".to_string(),
        ));
    };
    if start.is_all_day() != end.is_all_day() {
        return Err(CalendarError::InvalidArgument(
            "start and end of the new series must both be dates or both be date-times"
                .to_string(),
        ));
    }
    let ordered = match (start.parsed_date(), end.parsed_date()) {
        (Some(s), Some(e)) => e > s,
        _ => match (start.parsed_date_time(), end.parsed_date_time()) {
            (Some(s), Some(e)) => e > s,
            _ => true,
        },
    };
    if !ordered {
        return Err(CalendarError::InvalidArgument(
            "end of the new series must be after its start".to_string(),
        ));
    }
    Ok(())
}

/// Start of the continuation when the update does not move it.
///
/// All-day series stay all-day. A date-only locator on a timed series keeps
/// the series' wall-clock time; with a named zone the offset is left to the
/// API so daylight-saving changes are honoured.
fn anchor_start(original: &Event, locator: &OccurrenceLocator) -> EventDateTime {
    let Some(orig) = original.start.as_ref() else {
        return locator.anchor(None);
    };
    if orig.is_all_day() {
        return EventDateTime::all_day(locator.split_date());
    }

    let time_zone = orig.time_zone.clone();
    if let (Some(date), Some(orig_local)) = (locator.date(), orig.parsed_local_date_time()) {
        let local = date.and_time(orig_local.time());
        if let Some(zone) = &time_zone {
            return EventDateTime::local(local, zone.clone());
        }
        if let Some(dt) = orig
            .parsed_date_time()
            .and_then(|o| o.offset().from_local_datetime(&local).single())
        {
            return EventDateTime::timed(dt, None);
        }
    }
    locator.anchor(time_zone)
}

/// End that keeps the original event's duration from a new start.
///
/// `None` when the original span or the new start cannot be read, or when
/// they mix all-day and timed values.
fn shifted_end(original: &Event, new_start: &EventDateTime) -> Option<EventDateTime> {
    let (orig_start, orig_end) = (original.start.as_ref()?, original.end.as_ref()?);

    if new_start.is_all_day() {
        let days = (orig_end.parsed_date()? - orig_start.parsed_date()?).num_days();
        let end: NaiveDate = new_start
            .parsed_date()?
            .checked_add_signed(Duration::days(days))?;
        return Some(EventDateTime::all_day(end));
    }

    let span = match (orig_start.parsed_date_time(), orig_end.parsed_date_time()) {
        (Some(s), Some(e)) => e - s,
        _ => orig_end.parsed_local_date_time()? - orig_start.parsed_local_date_time()?,
    };

    if let Some(ns) = new_start.parsed_date_time() {
        let time_zone = orig_end
            .time_zone
            .clone()
            .or_else(|| new_start.time_zone.clone());
        return Some(EventDateTime::timed(ns + span, time_zone));
    }

    // Offset-less start: the end is wall-clock time in the start's zone
    let zone = new_start
        .time_zone
        .clone()
        .or_else(|| orig_end.time_zone.clone())?;
    Some(EventDateTime::local(
        new_start.parsed_local_date_time()? + span,
        zone,
    ))
}

/// Delete one occurrence of a series
pub async fn delete_instance(
    api: &dyn CalendarApi,
    calendar_id: &str,
    series_id: &str,
    locator: Option<&OccurrenceLocator>,
    send_updates: SendUpdates,
) -> Result<EventRef> {
    let target = instance_ref(series_id, locator)?;
    tracing::info!(calendar_id, instance = %target, send_updates = send_updates.as_str(), "deleting occurrence");
    api.delete_event(calendar_id, &target, send_updates).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::{ApiCall, InMemoryCalendar};
    use crate::recurrence::rrule::has_part;
    use crate::types::{Attendee, ReminderMethod, ReminderOverride, Reminders};
    use pretty_assertions::assert_eq;

    fn weekly_series() -> Event {
        Event {
            id: Some("abc123".to_string()),
            summary: Some("Weekly sync".to_string()),
            description: Some("Agenda in doc".to_string()),
            location: Some("Room 4".to_string()),
            start: Some(EventDateTime {
                date: None,
                date_time: Some("2024-01-05T10:00:00+09:00".to_string()),
                time_zone: Some("Asia/Tokyo".to_string()),
            }),
            end: Some(EventDateTime {
                date: None,
                date_time: Some("2024-01-05T11:00:00+09:00".to_string()),
                time_zone: Some("Asia/Tokyo".to_string()),
            }),
            attendees: Some(vec![Attendee {
                email: "kim@example.com".to_string(),
                ..Default::default()
            }]),
            reminders: Some(Reminders {
                use_default: Some(false),
                overrides: Some(vec![ReminderOverride {
                    method: ReminderMethod::Popup,
                    minutes: 10,
                }]),
            }),
            recurrence: Some(vec!["RRULE:FREQ=WEEKLY;COUNT=10".to_string()]),
            color_id: Some("3".to_string()),
            ..Default::default()
        }
    }

    fn single_event() -> Event {
        Event {
            id: Some("once".to_string()),
            summary: Some("Dentist".to_string()),
            ..Default::default()
        }
    }

    fn date_locator(date: &str) -> OccurrenceLocator {
        OccurrenceLocator::parse(Some(date), None).unwrap().unwrap()
    }

    fn datetime_locator(dt: &str) -> OccurrenceLocator {
        OccurrenceLocator::parse(None, Some(dt)).unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_single_instance_patches_instance_id() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        let loc = datetime_locator("2024-01-12T10:00:00+09:00");
        let update = EventUpdate {
            summary: Some("Moved".to_string()),
            ..Default::default()
        };

        let result = update_scoped(&api, "primary", "abc123", EditScope::SingleInstance, Some(&loc), &update)
            .await
            .unwrap();

        assert_eq!(result.scope(), EditScope::SingleInstance);
        let ScopedUpdate::SingleInstance { instance_id, event } = result else {
            panic!("wrong scope");
        };
        assert_eq!(instance_id, "abc123_20240112T010000Z");
        assert_eq!(event.summary.as_deref(), Some("Moved"));

        // The series itself is untouched
        let master = api.event("primary", "abc123").unwrap();
        assert_eq!(master.summary.as_deref(), Some("Weekly sync"));
        assert_eq!(master.recurrence_rules(), weekly_series().recurrence_rules());
    }

    #[tokio::test]
    async fn test_single_instance_without_locator_fails_before_any_call() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        let err = update_scoped(
            &api,
            "primary",
            "abc123",
            EditScope::SingleInstance,
            None,
            &EventUpdate::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_entire_series_patches_only_given_fields() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        let update = EventUpdate {
            summary: Some("X".to_string()),
            ..Default::default()
        };

        let result = update_scoped(&api, "primary", "abc123", EditScope::EntireSeries, None, &update)
            .await
            .unwrap();
        assert_eq!(result.scope(), EditScope::EntireSeries);

        assert_eq!(
            api.calls(),
            vec![ApiCall::Patch {
                calendar_id: "primary".to_string(),
                event_id: "abc123".to_string(),
                body: EventBody {
                    summary: Some("X".to_string()),
                    ..Default::default()
                },
            }]
        );
        let master = api.event("primary", "abc123").unwrap();
        let original = weekly_series();
        assert_eq!(master.summary.as_deref(), Some("X"));
        assert_eq!(master.start, original.start);
        assert_eq!(master.end, original.end);
        assert_eq!(master.attendees, original.attendees);
    }

    #[tokio::test]
    async fn test_split_weekly_series() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        let loc = date_locator("2024-03-01");
        let update = EventUpdate {
            location: Some("Room 9".to_string()),
            ..Default::default()
        };

        let result = update_scoped(&api, "primary", "abc123", EditScope::ThisAndFollowing, Some(&loc), &update)
            .await
            .unwrap();
        let ScopedUpdate::ThisAndFollowing(split) = result else {
            panic!("wrong scope");
        };

        assert_eq!(split.original_series_id, "abc123");
        assert_eq!(
            split.truncated_recurrence,
            vec!["RRULE:FREQ=WEEKLY;UNTIL=20240229T235959Z".to_string()]
        );
        assert_ne!(split.new_series_id, "abc123");

        let original = api.event("primary", "abc123").unwrap();
        assert_eq!(original.recurrence, Some(split.truncated_recurrence.clone()));
        assert_eq!(original.location.as_deref(), Some("Room 4"));

        let continuation = api.event("primary", &split.new_series_id).unwrap();
        assert_eq!(
            continuation.recurrence,
            Some(vec!["RRULE:FREQ=WEEKLY".to_string()])
        );
        // Date-only locator on a timed series keeps the wall-clock time
        assert_eq!(
            continuation.start,
            Some(EventDateTime {
                date: None,
                date_time: Some("2024-03-01T10:00:00".to_string()),
                time_zone: Some("Asia/Tokyo".to_string()),
            })
        );
        assert_eq!(
            continuation.end.as_ref().unwrap().date_time.as_deref(),
            Some("2024-03-01T11:00:00")
        );
        assert_eq!(continuation.location.as_deref(), Some("Room 9"));
        assert_eq!(continuation.summary.as_deref(), Some("Weekly sync"));
        assert_eq!(continuation.attendees, weekly_series().attendees);
        assert_eq!(continuation.reminders, weekly_series().reminders);
        assert_eq!(continuation.color_id.as_deref(), Some("3"));

        // fetch, truncate, insert in that order
        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], ApiCall::Get { .. }));
        assert!(matches!(&calls[1], ApiCall::Patch { body, .. } if body.recurrence.is_some() && body.summary.is_none()));
        assert!(matches!(calls[2], ApiCall::Insert { .. }));
    }

    #[tokio::test]
    async fn test_split_at_datetime_keeps_duration() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        let loc = datetime_locator("2024-03-01T10:00:00+09:00");

        let result = update_scoped(
            &api,
            "primary",
            "abc123",
            EditScope::ThisAndFollowing,
            Some(&loc),
            &EventUpdate::default(),
        )
        .await
        .unwrap();
        let ScopedUpdate::ThisAndFollowing(split) = result else {
            panic!("wrong scope");
        };

        let start = split.continuation.start.unwrap();
        assert_eq!(start.date_time.as_deref(), Some("2024-03-01T10:00:00+09:00"));
        assert_eq!(start.time_zone.as_deref(), Some("Asia/Tokyo"));
        let end = split.continuation.end.unwrap();
        assert_eq!(end.date_time.as_deref(), Some("2024-03-01T11:00:00+09:00"));
        assert_eq!(
            split.truncated_recurrence,
            vec!["RRULE:FREQ=WEEKLY;UNTIL=20240229T235959Z".to_string()]
        );
    }

    #[tokio::test]
    async fn test_split_uses_explicit_start_and_end() {
        let original = weekly_series();
        let update = EventUpdate {
            start: Some(EventDateTime {
                date_time: Some("2024-03-01T15:00:00+09:00".to_string()),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date_time: Some("2024-03-01T15:30:00+09:00".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let body = continuation_body(&original, &date_locator("2024-03-01"), &update);
        assert_eq!(body.start, update.start);
        assert_eq!(body.end, update.end);
    }

    #[tokio::test]
    async fn test_split_of_non_recurring_event_fails() {
        let api = InMemoryCalendar::new().with_event("primary", single_event());
        let loc = date_locator("2024-03-01");
        let err = update_scoped(
            &api,
            "primary",
            "once",
            EditScope::ThisAndFollowing,
            Some(&loc),
            &EventUpdate::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CalendarError::NotRecurring(_)));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_split_without_locator_writes_nothing() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        let err = update_scoped(
            &api,
            "primary",
            "abc123",
            EditScope::ThisAndFollowing,
            None,
            &EventUpdate::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument(_)));
        assert!(api
            .calls()
            .iter()
            .all(|c| matches!(c, ApiCall::Get { .. })));
    }

    #[tokio::test]
    async fn test_failed_truncation_leaves_series_untouched() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        api.fail_next(RemoteOperation::PatchEvent, 403, "Forbidden");
        let loc = date_locator("2024-03-01");

        let err = update_scoped(
            &api,
            "primary",
            "abc123",
            EditScope::ThisAndFollowing,
            Some(&loc),
            &EventUpdate::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.operation(), Some(RemoteOperation::TruncateSeries));
        assert!(api
            .calls()
            .iter()
            .all(|c| !matches!(c, ApiCall::Insert { .. })));
        let master = api.event("primary", "abc123").unwrap();
        assert!(has_part(&master.recurrence_rules()[0], "COUNT"));
    }

    #[tokio::test]
    async fn test_failed_insert_reports_partial_split() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        api.fail_next(RemoteOperation::InsertEvent, 500, "Backend Error");
        let loc = date_locator("2024-03-01");

        let err = update_scoped(
            &api,
            "primary",
            "abc123",
            EditScope::ThisAndFollowing,
            Some(&loc),
            &EventUpdate::default(),
        )
        .await
        .unwrap_err();

        let CalendarError::PartialSplit {
            series_id,
            truncated_recurrence,
            source,
        } = &err
        else {
            panic!("expected partial split, got {err:?}");
        };
        assert_eq!(series_id, "abc123");
        assert_eq!(
            truncated_recurrence,
            &vec!["RRULE:FREQ=WEEKLY;UNTIL=20240229T235959Z".to_string()]
        );
        assert_eq!(source.operation(), Some(RemoteOperation::InsertContinuation));

        // No rollback: the original stays truncated
        let master = api.event("primary", "abc123").unwrap();
        assert_eq!(master.recurrence.as_ref(), Some(truncated_recurrence));
    }

    #[tokio::test]
    async fn test_delete_instance_passes_notification_policy() {
        let api = InMemoryCalendar::new().with_event("primary", weekly_series());
        let loc = datetime_locator("2024-01-12T10:00:00+09:00");

        let deleted = delete_instance(&api, "primary", "abc123", Some(&loc), SendUpdates::ExternalOnly)
            .await
            .unwrap();
        assert_eq!(deleted.api_id(), "abc123_20240112T010000Z");
        assert_eq!(
            api.calls(),
            vec![ApiCall::Delete {
                calendar_id: "primary".to_string(),
                event_id: "abc123_20240112T010000Z".to_string(),
                send_updates: SendUpdates::ExternalOnly,
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_instance_requires_locator() {
        let api = InMemoryCalendar::new();
        let err = delete_instance(&api, "primary", "abc123", None, SendUpdates::All)
            .await
            .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument(_)));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_all_day_end_keeps_span() {
        let original = Event {
            start: Some(EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())),
            end: Some(EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())),
            recurrence: Some(vec!["RRULE:FREQ=MONTHLY".to_string()]),
            ..Default::default()
        };
        let body = continuation_body(&original, &date_locator("2024-04-01"), &EventUpdate::default());
        assert_eq!(body.end.unwrap().date.as_deref(), Some("2024-04-03"));
    }

    #[test]
    fn test_date_split_across_dst_keeps_wall_clock_time() {
        let original = Event {
            start: Some(EventDateTime {
                date: None,
                date_time: Some("2024-01-05T10:00:00-05:00".to_string()),
                time_zone: Some("America/New_York".to_string()),
            }),
            end: Some(EventDateTime {
                date: None,
                date_time: Some("2024-01-05T11:00:00-05:00".to_string()),
                time_zone: Some("America/New_York".to_string()),
            }),
            recurrence: Some(vec!["RRULE:FREQ=WEEKLY;BYDAY=FR".to_string()]),
            ..Default::default()
        };

        let body = continuation_body(&original, &date_locator("2024-07-05"), &EventUpdate::default());
        let start = body.start.unwrap();
        let end = body.end.unwrap();
        assert_eq!(start.date_time.as_deref(), Some("2024-07-05T10:00:00"));
        assert_eq!(start.time_zone.as_deref(), Some("America/New_York"));
        assert_eq!(end.date_time.as_deref(), Some("2024-07-05T11:00:00"));
        assert_eq!(end.time_zone.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn test_date_split_without_zone_keeps_offset() {
        let original = Event {
            start: Some(EventDateTime {
                date_time: Some("2024-01-05T10:00:00-05:00".to_string()),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date_time: Some("2024-01-05T10:45:00-05:00".to_string()),
                ..Default::default()
            }),
            recurrence: Some(vec!["RRULE:FREQ=DAILY".to_string()]),
            ..Default::default()
        };

        let body = continuation_body(&original, &date_locator("2024-07-05"), &EventUpdate::default());
        assert_eq!(
            body.start.unwrap().date_time.as_deref(),
            Some("2024-07-05T10:00:00-05:00")
        );
        assert_eq!(
            body.end.unwrap().date_time.as_deref(),
            Some("2024-07-05T10:45:00-05:00")
        );
    }

    fn all_day_series() -> Event {
        Event {
            id: Some("offsite".to_string()),
            start: Some(EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())),
            end: Some(EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap())),
            recurrence: Some(vec!["RRULE:FREQ=WEEKLY;COUNT=20".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_day_series_split_at_datetime_stays_all_day() {
        let body = continuation_body(
            &all_day_series(),
            &datetime_locator("2024-03-01T00:00:00+09:00"),
            &EventUpdate::default(),
        );
        assert_eq!(
            body.start,
            Some(EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert_eq!(
            body.end,
            Some(EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()))
        );
    }

    #[tokio::test]
    async fn test_mismatched_continuation_is_rejected_before_truncation() {
        let api = InMemoryCalendar::new().with_event("primary", all_day_series());
        let update = EventUpdate {
            start: Some(EventDateTime {
                date_time: Some("2024-03-01T09:00:00+09:00".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let err = update_scoped(
            &api,
            "primary",
            "offsite",
            EditScope::ThisAndFollowing,
            Some(&date_locator("2024-03-01")),
            &update,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CalendarError::InvalidArgument(_)));
        assert!(api
            .calls()
            .iter()
            .all(|c| matches!(c, ApiCall::Get { .. })));
        let master = api.event("primary", "offsite").unwrap();
        assert!(has_part(&master.recurrence_rules()[0], "COUNT"));

        // Explicit end of a different kind is rejected the same way
        let update = EventUpdate {
            end: Some(EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap())),
            ..update
        };
        let err = update_scoped(
            &api,
            "primary",
            "offsite",
            EditScope::ThisAndFollowing,
            Some(&date_locator("2024-03-01")),
            &update,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument(_)));
    }

    #[test]
    fn test_scope_wire_names_and_aliases() {
        let parse = |s: &str| serde_json::from_value::<EditScope>(serde_json::json!(s)).unwrap();
        assert_eq!(parse("thisEventOnly"), EditScope::SingleInstance);
        assert_eq!(parse("all"), EditScope::EntireSeries);
        assert_eq!(parse("thisAndFollowing"), EditScope::ThisAndFollowing);
        assert_eq!(parse("this-and-following"), EditScope::ThisAndFollowing);
        assert_eq!(parse("single-instance"), EditScope::SingleInstance);
        assert!(serde_json::from_value::<EditScope>(serde_json::json!("some")).is_err());
    }
}
