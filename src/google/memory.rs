//! In-memory calendar backend
//!
//! Mirrors the parts of the remote service's behaviour the tools rely on:
//! instance ids resolve against their series, patches touch only the fields
//! they carry, deleted instances become cancelled exceptions. Every call is
//! recorded, and a failure can be queued per operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::CalendarApi;
use crate::error::{CalendarError, RemoteOperation, Result};
use crate::recurrence::{EventRef, OccurrenceKey};
use crate::types::{
    Calendar, CalendarListEntry, ColorDefinition, Colors, Event, EventBody, EventDateTime,
    EventList, EventQuery, FreeBusyCalendar, FreeBusyError, FreeBusyRequest, FreeBusyResponse,
    SendUpdates, TimePeriod,
};

/// One recorded call against [`InMemoryCalendar`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Get {
        calendar_id: String,
        event_id: String,
    },
    Patch {
        calendar_id: String,
        event_id: String,
        body: EventBody,
    },
    Insert {
        calendar_id: String,
        body: EventBody,
    },
    Delete {
        calendar_id: String,
        event_id: String,
        send_updates: SendUpdates,
    },
    ListEvents {
        calendar_id: String,
        query: EventQuery,
    },
    GetCalendar {
        calendar_id: String,
    },
    ListCalendars,
    FreeBusy {
        request: FreeBusyRequest,
    },
    Colors,
}

#[derive(Default)]
struct State {
    calendars: BTreeMap<String, CalendarListEntry>,
    /// Events keyed by (calendar id, event id)
    events: BTreeMap<(String, String), Event>,
    calls: Vec<ApiCall>,
    failures: HashMap<&'static str, CalendarError>,
}

/// Calendar service held in memory
pub struct InMemoryCalendar {
    state: Mutex<State>,
    next_id: AtomicU64,
}

impl Default for InMemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCalendar {
    /// Create a backend holding one empty primary calendar
    pub fn new() -> Self {
        let mut state = State::default();
        state.calendars.insert(
            "primary".to_string(),
            CalendarListEntry {
                id: "primary".to_string(),
                summary: Some("Primary".to_string()),
                primary: Some(true),
                access_role: Some("owner".to_string()),
                time_zone: Some("UTC".to_string()),
                ..Default::default()
            },
        );
        Self {
            state: Mutex::new(state),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_calendar(self, entry: CalendarListEntry) -> Self {
        self.state.lock().calendars.insert(entry.id.clone(), entry);
        self
    }

    /// Seed an event, assigning an id when it has none
    pub fn with_event(self, calendar_id: &str, event: Event) -> Self {
        let id = event.id.clone().unwrap_or_else(|| self.fresh_id());
        let event = Event {
            id: Some(id.clone()),
            ..event
        };
        self.state
            .lock()
            .events
            .insert((calendar_id.to_string(), id), event);
        self
    }

    /// Make the next call of `operation` fail
    pub fn fail_next(&self, operation: RemoteOperation, status: u16, message: &str) {
        self.state.lock().failures.insert(
            operation.as_str(),
            CalendarError::remote(operation, Some(status), message),
        );
    }

    /// Calls recorded so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Stored copy of an event, if any
    pub fn event(&self, calendar_id: &str, event_id: &str) -> Option<Event> {
        self.state
            .lock()
            .events
            .get(&(calendar_id.to_string(), event_id.to_string()))
            .cloned()
    }

    fn fresh_id(&self) -> String {
        format!("evt{:04}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn record(&self, call: ApiCall, operation: RemoteOperation) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.failures.remove(operation.as_str()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(operation: RemoteOperation, what: &str) -> CalendarError {
        CalendarError::remote(operation, Some(404), format!("Not Found: {what}"))
    }

    /// Resolve an event or materialize an instance from its series
    fn resolve(state: &State, calendar_id: &str, event: &EventRef) -> Option<Event> {
        let key = (calendar_id.to_string(), event.api_id());
        if let Some(found) = state.events.get(&key) {
            return Some(found.clone());
        }
        let EventRef::Instance {
            series_id,
            occurrence,
        } = event
        else {
            return None;
        };
        let series = state
            .events
            .get(&(calendar_id.to_string(), series_id.clone()))?;
        if !series.is_recurring() {
            return None;
        }
        let start = match occurrence {
            OccurrenceKey::AllDay(d) => EventDateTime::all_day(*d),
            OccurrenceKey::Timed(dt) => EventDateTime {
                date: None,
                date_time: Some(dt.to_rfc3339()),
                time_zone: series.start.as_ref().and_then(|s| s.time_zone.clone()),
            },
        };
        Some(Event {
            id: Some(event.api_id()),
            recurrence: None,
            recurring_event_id: Some(series_id.clone()),
            original_start_time: Some(start.clone()),
            start: Some(start),
            ..series.clone()
        })
    }
}

fn apply(event: &mut Event, body: &EventBody) {
    let body = body.clone();
    if body.summary.is_some() {
        event.summary = body.summary;
    }
    if body.description.is_some() {
        event.description = body.description;
    }
    if body.location.is_some() {
        event.location = body.location;
    }
    if body.start.is_some() {
        event.start = body.start;
    }
    if body.end.is_some() {
        event.end = body.end;
    }
    if body.attendees.is_some() {
        event.attendees = body.attendees;
    }
    if body.recurrence.is_some() {
        event.recurrence = body.recurrence;
    }
    if body.reminders.is_some() {
        event.reminders = body.reminders;
    }
    if body.color_id.is_some() {
        event.color_id = body.color_id;
    }
    if body.visibility.is_some() {
        event.visibility = body.visibility;
    }
    if body.transparency.is_some() {
        event.transparency = body.transparency;
    }
    event.updated = Some(chrono::Utc::now().to_rfc3339());
}

fn matches_query(event: &Event, q: &str) -> bool {
    let q = q.to_lowercase();
    [&event.summary, &event.description, &event.location]
        .iter()
        .filter_map(|f| f.as_deref())
        .any(|text| text.to_lowercase().contains(&q))
}

#[async_trait]
impl CalendarApi for InMemoryCalendar {
    async fn get_event(&self, calendar_id: &str, event: &EventRef) -> Result<Event> {
        let op = RemoteOperation::FetchEvent;
        self.record(
            ApiCall::Get {
                calendar_id: calendar_id.to_string(),
                event_id: event.api_id(),
            },
            op,
        )?;
        let state = self.state.lock();
        Self::resolve(&state, calendar_id, event).ok_or_else(|| Self::not_found(op, &event.api_id()))
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event: &EventRef,
        body: &EventBody,
    ) -> Result<Event> {
        let op = RemoteOperation::PatchEvent;
        self.record(
            ApiCall::Patch {
                calendar_id: calendar_id.to_string(),
                event_id: event.api_id(),
                body: body.clone(),
            },
            op,
        )?;
        let mut state = self.state.lock();
        let mut target = Self::resolve(&state, calendar_id, event)
            .ok_or_else(|| Self::not_found(op, &event.api_id()))?;
        apply(&mut target, body);
        state
            .events
            .insert((calendar_id.to_string(), event.api_id()), target.clone());
        Ok(target)
    }

    async fn insert_event(&self, calendar_id: &str, body: &EventBody) -> Result<Event> {
        let op = RemoteOperation::InsertEvent;
        self.record(
            ApiCall::Insert {
                calendar_id: calendar_id.to_string(),
                body: body.clone(),
            },
            op,
        )?;
        let id = self.fresh_id();
        let mut event = Event {
            id: Some(id.clone()),
            status: Some("confirmed".to_string()),
            html_link: Some(format!("https://calendar.example/event?eid={id}")),
            ..Default::default()
        };
        apply(&mut event, body);
        event.created = event.updated.clone();
        self.state
            .lock()
            .events
            .insert((calendar_id.to_string(), id), event.clone());
        Ok(event)
    }

    async fn delete_event(
        &self,
        calendar_id: &str,
        event: &EventRef,
        send_updates: SendUpdates,
    ) -> Result<()> {
        let op = RemoteOperation::DeleteEvent;
        self.record(
            ApiCall::Delete {
                calendar_id: calendar_id.to_string(),
                event_id: event.api_id(),
                send_updates,
            },
            op,
        )?;
        let mut state = self.state.lock();
        let mut target = Self::resolve(&state, calendar_id, event)
            .filter(|e| e.status.as_deref() != Some("cancelled"))
            .ok_or_else(|| Self::not_found(op, &event.api_id()))?;
        let key = (calendar_id.to_string(), event.api_id());
        match event {
            EventRef::Event(_) => {
                state.events.remove(&key);
            }
            EventRef::Instance { .. } => {
                target.status = Some("cancelled".to_string());
                state.events.insert(key, target);
            }
        }
        Ok(())
    }

    async fn list_events(&self, calendar_id: &str, query: &EventQuery) -> Result<EventList> {
        self.record(
            ApiCall::ListEvents {
                calendar_id: calendar_id.to_string(),
                query: query.clone(),
            },
            RemoteOperation::ListEvents,
        )?;
        let state = self.state.lock();
        let limit = query.max_results.unwrap_or(250) as usize;
        let items = state
            .events
            .iter()
            .filter(|((cal, _), e)| cal == calendar_id && e.status.as_deref() != Some("cancelled"))
            .map(|(_, e)| e)
            .filter(|e| query.q.as_deref().map_or(true, |q| matches_query(e, q)))
            .take(limit)
            .cloned()
            .collect();
        Ok(EventList {
            items,
            next_page_token: None,
        })
    }

    async fn get_calendar(&self, calendar_id: &str) -> Result<Calendar> {
        let op = RemoteOperation::GetCalendar;
        self.record(
            ApiCall::GetCalendar {
                calendar_id: calendar_id.to_string(),
            },
            op,
        )?;
        let state = self.state.lock();
        let entry = state
            .calendars
            .get(calendar_id)
            .ok_or_else(|| Self::not_found(op, calendar_id))?;
        Ok(Calendar {
            id: entry.id.clone(),
            summary: entry.summary.clone(),
            description: entry.description.clone(),
            time_zone: entry.time_zone.clone(),
            location: None,
        })
    }

    async fn list_calendars(&self) -> Result<Vec<CalendarListEntry>> {
        self.record(ApiCall::ListCalendars, RemoteOperation::ListCalendars)?;
        Ok(self.state.lock().calendars.values().cloned().collect())
    }

    async fn query_freebusy(&self, request: &FreeBusyRequest) -> Result<FreeBusyResponse> {
        self.record(
            ApiCall::FreeBusy {
                request: request.clone(),
            },
            RemoteOperation::QueryFreeBusy,
        )?;
        let state = self.state.lock();
        let mut calendars = BTreeMap::new();
        for item in &request.items {
            let entry = if state.calendars.contains_key(&item.id) {
                let busy = state
                    .events
                    .iter()
                    .filter(|((cal, _), e)| {
                        cal == &item.id
                            && e.status.as_deref() != Some("cancelled")
                            && e.transparency != Some(crate::types::Transparency::Transparent)
                    })
                    .filter_map(|(_, e)| {
                        let start = e.start.as_ref()?.date_time.clone()?;
                        let end = e.end.as_ref()?.date_time.clone()?;
                        Some(TimePeriod { start, end })
                    })
                    .collect();
                FreeBusyCalendar {
                    busy,
                    errors: Vec::new(),
                }
            } else {
                FreeBusyCalendar {
                    busy: Vec::new(),
                    errors: vec![FreeBusyError {
                        domain: "global".to_string(),
                        reason: "notFound".to_string(),
                    }],
                }
            };
            calendars.insert(item.id.clone(), entry);
        }
        Ok(FreeBusyResponse {
            time_min: request.time_min.clone(),
            time_max: request.time_max.clone(),
            calendars,
        })
    }

    async fn get_colors(&self) -> Result<Colors> {
        self.record(ApiCall::Colors, RemoteOperation::GetColors)?;
        let color = |background: &str, foreground: &str| ColorDefinition {
            background: background.to_string(),
            foreground: foreground.to_string(),
        };
        Ok(Colors {
            calendar: BTreeMap::from([("1".to_string(), color("#ac725e", "#1d1d1d"))]),
            event: BTreeMap::from([
                ("1".to_string(), color("#a4bdfc", "#1d1d1d")),
                ("11".to_string(), color("#dc2127", "#1d1d1d")),
            ]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{instance_ref, OccurrenceLocator};

    fn series() -> Event {
        Event {
            id: Some("series1".to_string()),
            summary: Some("Standup".to_string()),
            start: Some(EventDateTime {
                date_time: Some("2024-01-01T10:00:00+09:00".to_string()),
                time_zone: Some("Asia/Tokyo".to_string()),
                ..Default::default()
            }),
            recurrence: Some(vec!["RRULE:FREQ=DAILY".to_string()]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_instance_resolves_against_series() {
        let cal = InMemoryCalendar::new().with_event("primary", series());
        let loc = OccurrenceLocator::parse(Some("2024-01-05"), None).unwrap();
        let instance = instance_ref("series1", loc.as_ref()).unwrap();

        let event = cal.get_event("primary", &instance).await.unwrap();
        assert_eq!(event.id.as_deref(), Some("series1_20240105"));
        assert_eq!(event.recurring_event_id.as_deref(), Some("series1"));
        assert!(!event.is_recurring());
    }

    #[tokio::test]
    async fn test_queued_failure_fires_once() {
        let cal = InMemoryCalendar::new().with_event("primary", series());
        cal.fail_next(RemoteOperation::FetchEvent, 500, "backend error");

        let target = EventRef::event("series1");
        assert!(cal.get_event("primary", &target).await.is_err());
        assert!(cal.get_event("primary", &target).await.is_ok());
        assert_eq!(cal.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_an_instance_cancels_it() {
        let cal = InMemoryCalendar::new().with_event("primary", series());
        let loc = OccurrenceLocator::parse(Some("2024-01-05"), None).unwrap();
        let instance = instance_ref("series1", loc.as_ref()).unwrap();

        cal.delete_event("primary", &instance, SendUpdates::None)
            .await
            .unwrap();
        let stored = cal.event("primary", "series1_20240105").unwrap();
        assert_eq!(stored.status.as_deref(), Some("cancelled"));
        assert!(cal.event("primary", "series1").is_some());

        // Second delete of the same occurrence is a 404
        let err = cal
            .delete_event("primary", &instance, SendUpdates::None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }
}
