//! MCP tool definitions for the calendar server

use serde_json::json;

use super::protocol::ToolDefinition;

/// All tool definitions: (name, description, JSON schema)
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    // Calendars
    (
        "list_calendars",
        "List the calendars the authenticated user can see",
        r#"{
            "type": "object",
            "properties": {},
            "required": []
        }"#,
    ),
    (
        "get_calendar",
        "Get metadata (name, time zone, location) of one calendar",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID: \"primary\" or a calendar email address (default: primary)"}
            },
            "required": []
        }"#,
    ),
    // Events
    (
        "list_events",
        "List events in a time range",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "timeMin": {"type": "string", "description": "Lower bound of event end time, RFC 3339 (e.g. 2024-01-01T00:00:00Z)"},
                "timeMax": {"type": "string", "description": "Upper bound of event start time, RFC 3339"},
                "maxResults": {"type": "integer", "minimum": 1, "maximum": 2500, "default": 100, "description": "Maximum number of events"},
                "q": {"type": "string", "description": "Free-text filter"},
                "singleEvents": {"type": "boolean", "default": true, "description": "Expand recurring events into individual occurrences"},
                "orderBy": {"type": "string", "enum": ["startTime", "updated"], "default": "startTime"},
                "pageToken": {"type": "string", "description": "Token from a previous response's nextPageToken"}
            },
            "required": []
        }"#,
    ),
    (
        "get_event",
        "Get full details of one event",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "eventId": {"type": "string", "description": "Event ID"}
            },
            "required": ["eventId"]
        }"#,
    ),
    (
        "search_events",
        "Search events by keyword; recurring events are expanded and results ordered by start time",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "query": {"type": "string", "description": "Keywords matched against title, description, location and attendees"},
                "timeMin": {"type": "string", "description": "Search from, RFC 3339"},
                "timeMax": {"type": "string", "description": "Search until, RFC 3339"},
                "maxResults": {"type": "integer", "minimum": 1, "maximum": 2500, "default": 50}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "create_event",
        "Create an event. Use start/end.dateTime for timed events and start/end.date for all-day events",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "summary": {"type": "string", "description": "Event title"},
                "description": {"type": "string"},
                "location": {"type": "string"},
                "start": {
                    "type": "object",
                    "properties": {
                        "dateTime": {"type": "string", "description": "RFC 3339, e.g. 2024-01-15T10:00:00+09:00"},
                        "date": {"type": "string", "description": "All-day start, YYYY-MM-DD"},
                        "timeZone": {"type": "string", "description": "IANA time zone, e.g. Asia/Tokyo"}
                    }
                },
                "end": {
                    "type": "object",
                    "properties": {
                        "dateTime": {"type": "string"},
                        "date": {"type": "string", "description": "All-day end (exclusive), YYYY-MM-DD"},
                        "timeZone": {"type": "string"}
                    }
                },
                "attendees": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "email": {"type": "string"},
                            "optional": {"type": "boolean"}
                        },
                        "required": ["email"]
                    }
                },
                "recurrence": {"type": "array", "items": {"type": "string"}, "description": "RRULE/EXDATE/RDATE lines, e.g. [\"RRULE:FREQ=WEEKLY;COUNT=10\"]"},
                "reminders": {
                    "type": "object",
                    "properties": {
                        "useDefault": {"type": "boolean"},
                        "overrides": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "method": {"type": "string", "enum": ["email", "popup"]},
                                    "minutes": {"type": "integer", "minimum": 0}
                                },
                                "required": ["method", "minutes"]
                            }
                        }
                    }
                },
                "colorId": {"type": "string", "description": "Event color ID (see list_colors)"},
                "visibility": {"type": "string", "enum": ["default", "public", "private", "confidential"]},
                "transparency": {"type": "string", "enum": ["opaque", "transparent"], "description": "opaque blocks time, transparent does not"}
            },
            "required": ["summary", "start", "end"]
        }"#,
    ),
    (
        "update_event",
        "Update an event; only the given fields change. For recurring series use update_recurring_event",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "eventId": {"type": "string", "description": "Event ID"},
                "summary": {"type": "string"},
                "description": {"type": "string"},
                "location": {"type": "string"},
                "start": {"type": "object", "properties": {"dateTime": {"type": "string"}, "date": {"type": "string"}, "timeZone": {"type": "string"}}},
                "end": {"type": "object", "properties": {"dateTime": {"type": "string"}, "date": {"type": "string"}, "timeZone": {"type": "string"}}},
                "attendees": {"type": "array", "items": {"type": "object", "properties": {"email": {"type": "string"}, "optional": {"type": "boolean"}}, "required": ["email"]}},
                "colorId": {"type": "string"},
                "visibility": {"type": "string", "enum": ["default", "public", "private", "confidential"]},
                "transparency": {"type": "string", "enum": ["opaque", "transparent"]}
            },
            "required": ["eventId"]
        }"#,
    ),
    (
        "delete_event",
        "Delete an event",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "eventId": {"type": "string", "description": "Event ID"},
                "sendUpdates": {"type": "string", "enum": ["all", "externalOnly", "none"], "default": "all", "description": "Who gets notified"}
            },
            "required": ["eventId"]
        }"#,
    ),
    // Recurring events
    (
        "update_recurring_event",
        "Update a recurring event with one of three scopes: thisEventOnly (one occurrence), all (every occurrence), thisAndFollowing (split the series at an occurrence and apply the change from there on)",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "eventId": {"type": "string", "description": "ID of the recurring series (recurringEventId)"},
                "scope": {"type": "string", "enum": ["thisEventOnly", "all", "thisAndFollowing"], "description": "thisEventOnly = this occurrence, all = the whole series, thisAndFollowing = this and later occurrences"},
                "instanceDate": {"type": "string", "description": "Occurrence date for all-day series, YYYY-MM-DD. Required for thisEventOnly/thisAndFollowing unless instanceDateTime is given"},
                "instanceDateTime": {"type": "string", "description": "Occurrence start, RFC 3339. Required for thisEventOnly/thisAndFollowing unless instanceDate is given"},
                "summary": {"type": "string"},
                "description": {"type": "string"},
                "location": {"type": "string"},
                "start": {"type": "object", "properties": {"dateTime": {"type": "string"}, "date": {"type": "string"}, "timeZone": {"type": "string"}}},
                "end": {"type": "object", "properties": {"dateTime": {"type": "string"}, "date": {"type": "string"}, "timeZone": {"type": "string"}}},
                "colorId": {"type": "string"}
            },
            "required": ["eventId", "scope"]
        }"#,
    ),
    (
        "delete_recurring_instance",
        "Delete a single occurrence of a recurring event",
        r#"{
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "Calendar ID (default: primary)"},
                "eventId": {"type": "string", "description": "ID of the recurring series"},
                "instanceDate": {"type": "string", "description": "Occurrence date for all-day series, YYYY-MM-DD"},
                "instanceDateTime": {"type": "string", "description": "Occurrence start, RFC 3339"},
                "sendUpdates": {"type": "string", "enum": ["all", "externalOnly", "none"], "default": "all"}
            },
            "required": ["eventId"]
        }"#,
    ),
    // Availability and palettes
    (
        "get_freebusy",
        "Get busy periods of one or more calendars in a time range",
        r#"{
            "type": "object",
            "properties": {
                "timeMin": {"type": "string", "description": "Range start, RFC 3339 (e.g. 2024-01-15T00:00:00+09:00)"},
                "timeMax": {"type": "string", "description": "Range end, RFC 3339"},
                "calendarIds": {"type": "array", "items": {"type": "string"}, "default": ["primary"]},
                "timeZone": {"type": "string", "description": "Time zone of the response, e.g. Asia/Tokyo"}
            },
            "required": ["timeMin", "timeMax"]
        }"#,
    ),
    (
        "list_colors",
        "List the calendar and event color palettes",
        r#"{
            "type": "object",
            "properties": {},
            "required": []
        }"#,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}
