//! Calendar API access
//!
//! [`CalendarApi`] is the seam between tool logic and the remote service:
//! - [`GoogleCalendarClient`] talks to Google Calendar v3 over HTTPS
//! - [`InMemoryCalendar`] keeps events in memory and records every call

mod client;
mod memory;

pub use client::{GoogleCalendarClient, DEFAULT_API_BASE_URL};
pub use memory::{ApiCall, InMemoryCalendar};

use async_trait::async_trait;

use crate::error::Result;
use crate::recurrence::EventRef;
use crate::types::{
    Calendar, CalendarListEntry, Colors, Event, EventBody, EventList, EventQuery, FreeBusyRequest,
    FreeBusyResponse, SendUpdates,
};

/// Operations the tools need from a calendar service
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn get_event(&self, calendar_id: &str, event: &EventRef) -> Result<Event>;

    /// Apply only the fields set in `body`
    async fn patch_event(&self, calendar_id: &str, event: &EventRef, body: &EventBody)
        -> Result<Event>;

    async fn insert_event(&self, calendar_id: &str, body: &EventBody) -> Result<Event>;

    async fn delete_event(
        &self,
        calendar_id: &str,
        event: &EventRef,
        send_updates: SendUpdates,
    ) -> Result<()>;

    async fn list_events(&self, calendar_id: &str, query: &EventQuery) -> Result<EventList>;

    async fn get_calendar(&self, calendar_id: &str) -> Result<Calendar>;

    async fn list_calendars(&self) -> Result<Vec<CalendarListEntry>>;

    async fn query_freebusy(&self, request: &FreeBusyRequest) -> Result<FreeBusyResponse>;

    async fn get_colors(&self) -> Result<Colors>;
}
