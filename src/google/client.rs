//! Google Calendar v3 REST client

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::CalendarApi;
use crate::auth::TokenSource;
use crate::error::{CalendarError, RemoteOperation, Result};
use crate::recurrence::EventRef;
use crate::types::{
    Calendar, CalendarListEntry, CalendarListPage, Colors, Event, EventBody, EventList, EventQuery,
    FreeBusyRequest, FreeBusyResponse, SendUpdates,
};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Calendar client authenticated through a [`TokenSource`]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleCalendarClient {
    /// Create a client against the public API
    pub fn new(tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Self::with_base_url(tokens, DEFAULT_API_BASE_URL)
    }

    /// Create a client against a custom endpoint (proxies, emulators)
    pub fn with_base_url(tokens: Arc<dyn TokenSource>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| CalendarError::Config(format!("invalid API base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CalendarError::Config(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
        })
    }

    /// Build `<base>/<segments...>` with each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn event_url(&self, calendar_id: &str, event: &EventRef) -> Url {
        let id = event.api_id();
        self.endpoint(&["calendars", calendar_id, "events", &id])
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, operation: RemoteOperation, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| CalendarError::remote(operation, None, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => {
                let reason = envelope
                    .error
                    .errors
                    .first()
                    .map(|d| d.reason.as_str())
                    .filter(|r| !r.is_empty());
                match reason {
                    Some(reason) => format!("{} ({})", envelope.error.message, reason),
                    None => envelope.error.message,
                }
            }
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => body.chars().take(512).collect(),
        };

        tracing::debug!(%operation, status = status.as_u16(), "calendar API error: {}", message);
        Err(CalendarError::remote(operation, Some(status.as_u16()), message))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: RemoteOperation,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CalendarError::remote(operation, None, format!("malformed response: {e}")))
    }
}

/// Query pairs for an events list request
pub(crate) fn event_query_pairs(query: &EventQuery) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(v) = &query.time_min {
        pairs.push(("timeMin", v.clone()));
    }
    if let Some(v) = &query.time_max {
        pairs.push(("timeMax", v.clone()));
    }
    if let Some(v) = query.max_results {
        pairs.push(("maxResults", v.to_string()));
    }
    if let Some(v) = &query.q {
        pairs.push(("q", v.clone()));
    }
    if let Some(v) = query.single_events {
        pairs.push(("singleEvents", v.to_string()));
    }
    if let Some(v) = query.order_by {
        pairs.push(("orderBy", v.as_str().to_string()));
    }
    if let Some(v) = &query.page_token {
        pairs.push(("pageToken", v.clone()));
    }
    pairs
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn get_event(&self, calendar_id: &str, event: &EventRef) -> Result<Event> {
        tracing::debug!(calendar_id, event = %event, "get event");
        let request = self
            .request(Method::GET, self.event_url(calendar_id, event))
            .await?;
        self.send_json(RemoteOperation::FetchEvent, request).await
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event: &EventRef,
        body: &EventBody,
    ) -> Result<Event> {
        tracing::debug!(calendar_id, event = %event, "patch event");
        let request = self
            .request(Method::PATCH, self.event_url(calendar_id, event))
            .await?
            .json(body);
        self.send_json(RemoteOperation::PatchEvent, request).await
    }

    async fn insert_event(&self, calendar_id: &str, body: &EventBody) -> Result<Event> {
        tracing::debug!(calendar_id, "insert event");
        let url = self.endpoint(&["calendars", calendar_id, "events"]);
        let request = self.request(Method::POST, url).await?.json(body);
        self.send_json(RemoteOperation::InsertEvent, request).await
    }

    async fn delete_event(
        &self,
        calendar_id: &str,
        event: &EventRef,
        send_updates: SendUpdates,
    ) -> Result<()> {
        tracing::debug!(calendar_id, event = %event, send_updates = send_updates.as_str(), "delete event");
        let request = self
            .request(Method::DELETE, self.event_url(calendar_id, event))
            .await?
            .query(&[("sendUpdates", send_updates.as_str())]);
        self.send(RemoteOperation::DeleteEvent, request).await?;
        Ok(())
    }

    async fn list_events(&self, calendar_id: &str, query: &EventQuery) -> Result<EventList> {
        tracing::debug!(calendar_id, ?query, "list events");
        let url = self.endpoint(&["calendars", calendar_id, "events"]);
        let request = self
            .request(Method::GET, url)
            .await?
            .query(&event_query_pairs(query));
        self.send_json(RemoteOperation::ListEvents, request).await
    }

    async fn get_calendar(&self, calendar_id: &str) -> Result<Calendar> {
        tracing::debug!(calendar_id, "get calendar");
        let url = self.endpoint(&["calendars", calendar_id]);
        let request = self.request(Method::GET, url).await?;
        self.send_json(RemoteOperation::GetCalendar, request).await
    }

    async fn list_calendars(&self) -> Result<Vec<CalendarListEntry>> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self.endpoint(&["users", "me", "calendarList"]);
            let mut request = self.request(Method::GET, url).await?;
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: CalendarListPage = self
                .send_json(RemoteOperation::ListCalendars, request)
                .await?;
            calendars.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("listed {} calendars", calendars.len());
        Ok(calendars)
    }

    async fn query_freebusy(&self, request: &FreeBusyRequest) -> Result<FreeBusyResponse> {
        tracing::debug!(calendars = request.items.len(), "query free/busy");
        let url = self.endpoint(&["freeBusy"]);
        let builder = self.request(Method::POST, url).await?.json(request);
        self.send_json(RemoteOperation::QueryFreeBusy, builder).await
    }

    async fn get_colors(&self) -> Result<Colors> {
        let url = self.endpoint(&["colors"]);
        let request = self.request(Method::GET, url).await?;
        self.send_json(RemoteOperation::GetColors, request).await
    }
}
