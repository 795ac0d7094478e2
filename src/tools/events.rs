//! Plain event CRUD and listing

use serde::{Deserialize, Serialize};

use super::{default_calendar_id, default_true, require_id};
use crate::error::{CalendarError, Result};
use crate::google::CalendarApi;
use crate::recurrence::EventRef;
use crate::types::{
    Attendee, Event, EventBody, EventDateTime, EventQuery, OrderBy, Person, Reminders,
    SendUpdates, Transparency, Visibility,
};

/// Google caps a single events page at 2500 items
const MAX_PAGE_SIZE: u32 = 2500;

fn default_list_max() -> u32 {
    100
}

fn default_search_max() -> u32 {
    50
}

fn check_page_size(max_results: u32) -> Result<u32> {
    if max_results == 0 || max_results > MAX_PAGE_SIZE {
        return Err(CalendarError::InvalidArgument(format!(
            "maxResults must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(max_results)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    #[serde(default = "default_list_max")]
    pub max_results: u32,
    pub q: Option<String>,
    #[serde(default = "default_true")]
    pub single_events: bool,
    #[serde(default)]
    pub order_by: OrderBy,
    pub page_token: Option<String>,
}

/// Event as shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl From<Event> for EventListing {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            summary: e.summary,
            description: e.description,
            location: e.location,
            start: e.start,
            end: e.end,
            status: e.status,
            html_link: e.html_link,
            created: e.created,
            updated: e.updated,
            creator: e.creator,
            organizer: e.organizer,
            attendees: e.attendees,
            recurrence: e.recurrence,
            recurring_event_id: e.recurring_event_id,
            color_id: e.color_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListOutput {
    pub events: Vec<EventListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

pub async fn list_events(api: &dyn CalendarApi, args: ListEventsArgs) -> Result<EventListOutput> {
    let max_results = check_page_size(args.max_results)?;

    // Google rejects startTime ordering unless recurring events are expanded
    let order_by = match (args.single_events, args.order_by) {
        (false, OrderBy::StartTime) => None,
        (_, order) => Some(order),
    };

    let query = EventQuery {
        time_min: args.time_min,
        time_max: args.time_max,
        max_results: Some(max_results),
        q: args.q.filter(|q| !q.trim().is_empty()),
        single_events: Some(args.single_events),
        order_by,
        page_token: args.page_token,
    };
    let list = api.list_events(&args.calendar_id, &query).await?;

    Ok(EventListOutput {
        events: list.items.into_iter().map(EventListing::from).collect(),
        next_page_token: list.next_page_token,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEventArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub event_id: String,
}

pub async fn get_event(api: &dyn CalendarApi, args: GetEventArgs) -> Result<Event> {
    let id = require_id("eventId", &args.event_id)?;
    api.get_event(&args.calendar_id, &EventRef::event(id)).await
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEventsArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub query: String,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    #[serde(default = "default_search_max")]
    pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutput {
    pub events: Vec<SearchHit>,
}

pub async fn search_events(api: &dyn CalendarApi, args: SearchEventsArgs) -> Result<SearchOutput> {
    if args.query.trim().is_empty() {
        return Err(CalendarError::InvalidArgument(
            "query must not be empty".to_string(),
        ));
    }
    let query = EventQuery {
        time_min: args.time_min,
        time_max: args.time_max,
        max_results: Some(check_page_size(args.max_results)?),
        q: Some(args.query),
        single_events: Some(true),
        order_by: Some(OrderBy::StartTime),
        page_token: None,
    };
    let list = api.list_events(&args.calendar_id, &query).await?;

    let events = list
        .items
        .into_iter()
        .map(|e| SearchHit {
            id: e.id,
            summary: e.summary,
            description: e.description,
            location: e.location,
            start: e.start,
            end: e.end,
            html_link: e.html_link,
        })
        .collect();
    Ok(SearchOutput { events })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Option<Vec<Attendee>>,
    pub recurrence: Option<Vec<String>>,
    pub reminders: Option<Reminders>,
    pub color_id: Option<String>,
    pub visibility: Option<Visibility>,
    pub transparency: Option<Transparency>,
}

/// Short confirmation returned by create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

pub async fn create_event(api: &dyn CalendarApi, args: CreateEventArgs) -> Result<EventReceipt> {
    args.start.validate("start")?;
    args.end.validate("end")?;

    let body = EventBody {
        summary: Some(args.summary),
        description: args.description,
        location: args.location,
        start: Some(args.start),
        end: Some(args.end),
        attendees: args.attendees,
        recurrence: args.recurrence,
        reminders: args.reminders,
        color_id: args.color_id,
        visibility: args.visibility,
        transparency: args.transparency,
    };
    let event = api.insert_event(&args.calendar_id, &body).await?;
    tracing::info!(calendar_id = %args.calendar_id, id = ?event.id, "created event");

    Ok(EventReceipt {
        id: event.id,
        summary: event.summary,
        html_link: event.html_link,
        start: event.start,
        end: event.end,
        status: event.status,
        updated: None,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub event_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    pub attendees: Option<Vec<Attendee>>,
    pub color_id: Option<String>,
    pub visibility: Option<Visibility>,
    pub transparency: Option<Transparency>,
}

pub async fn update_event(api: &dyn CalendarApi, args: UpdateEventArgs) -> Result<EventReceipt> {
    let id = require_id("eventId", &args.event_id)?;
    if let Some(start) = &args.start {
        start.validate("start")?;
    }
    if let Some(end) = &args.end {
        end.validate("end")?;
    }

    let body = EventBody {
        summary: args.summary,
        description: args.description,
        location: args.location,
        start: args.start,
        end: args.end,
        attendees: args.attendees,
        color_id: args.color_id,
        visibility: args.visibility,
        transparency: args.transparency,
        ..Default::default()
    };
    let event = api
        .patch_event(&args.calendar_id, &EventRef::event(id), &body)
        .await?;

    Ok(EventReceipt {
        id: event.id,
        summary: event.summary,
        html_link: event.html_link,
        start: event.start,
        end: event.end,
        status: None,
        updated: event.updated,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventArgs {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub event_id: String,
    #[serde(default)]
    pub send_updates: SendUpdates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutput {
    pub success: bool,
    pub message: String,
}

pub async fn delete_event(api: &dyn CalendarApi, args: DeleteEventArgs) -> Result<DeleteOutput> {
    let id = require_id("eventId", &args.event_id)?;
    api.delete_event(&args.calendar_id, &EventRef::event(id), args.send_updates)
        .await?;
    Ok(DeleteOutput {
        success: true,
        message: format!("Deleted event {id}"),
    })
}
