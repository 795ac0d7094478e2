//! Tool operations exposed over MCP
//!
//! Each tool takes a typed, camelCase argument record decoded from the
//! `tools/call` arguments and returns a serializable projection of the API
//! response. Decoding failures surface as [`CalendarError::InvalidArgument`].

pub mod calendars;
pub mod events;
pub mod freebusy;
pub mod recurring;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CalendarError, Result};
use crate::google::CalendarApi;

pub(crate) fn default_calendar_id() -> String {
    "primary".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}

/// Decode tool arguments; a missing argument object counts as `{}`
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| CalendarError::InvalidArgument(format!("invalid arguments for {tool}: {e}")))
}

pub(crate) fn require_id<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(CalendarError::InvalidArgument(format!(
            "{field} must not be empty"
        )));
    }
    Ok(value)
}

fn to_value(output: impl Serialize) -> Result<Value> {
    Ok(serde_json::to_value(output)?)
}

/// Run the named tool against `api`
pub async fn call_tool(api: &dyn CalendarApi, name: &str, args: Value) -> Result<Value> {
    tracing::debug!(tool = name, "calling tool");
    match name {
        "list_calendars" => to_value(calendars::list_calendars(api).await?),
        "get_calendar" => to_value(calendars::get_calendar(api, parse_args(name, args)?).await?),
        "list_colors" => to_value(calendars::list_colors(api).await?),
        "list_events" => to_value(events::list_events(api, parse_args(name, args)?).await?),
        "get_event" => to_value(events::get_event(api, parse_args(name, args)?).await?),
        "search_events" => to_value(events::search_events(api, parse_args(name, args)?).await?),
        "create_event" => to_value(events::create_event(api, parse_args(name, args)?).await?),
        "update_event" => to_value(events::update_event(api, parse_args(name, args)?).await?),
        "delete_event" => to_value(events::delete_event(api, parse_args(name, args)?).await?),
        "update_recurring_event" => to_value(
            recurring::update_recurring_event(api, parse_args(name, args)?).await?,
        ),
        "delete_recurring_instance" => to_value(
            recurring::delete_recurring_instance(api, parse_args(name, args)?).await?,
        ),
        "get_freebusy" => to_value(freebusy::get_freebusy(api, parse_args(name, args)?).await?),
        _ => Err(CalendarError::InvalidArgument(format!("Unknown tool: {name}"))),
    }
}
