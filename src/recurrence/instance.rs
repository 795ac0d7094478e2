//! Addressing single occurrences of a recurring series
//!
//! The API exposes one occurrence of a series as `<seriesId>_<stamp>`, where
//! the stamp is the occurrence's start as compact UTC (`20240115T010000Z`) for
//! timed events or the bare date (`20240115`) for all-day events.
//! [`instance_ref`] is the only place that builds such identifiers.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::error::{CalendarError, Result};
use crate::types::EventDateTime;

const LOCATOR_REQUIRED: &str = "instanceDate or instanceDateTime is required";

/// Where an occurrence sits in its series
///
/// When a caller supplies both a date and a datetime that agree, the datetime
/// is kept: it pins the occurrence exactly and implies the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceLocator {
    /// All-day occurrence, or a timed one named only by its local date
    Date(NaiveDate),
    /// Timed occurrence, with the offset it was given in
    DateTime(DateTime<FixedOffset>),
}

impl OccurrenceLocator {
    pub fn on_date(date: NaiveDate) -> Self {
        OccurrenceLocator::Date(date)
    }

    pub fn at(date_time: DateTime<FixedOffset>) -> Self {
        OccurrenceLocator::DateTime(date_time)
    }

    /// Parse the `instanceDate` / `instanceDateTime` tool arguments.
    ///
    /// Returns `Ok(None)` when neither is given. When both are given the
    /// datetime's local date must equal the date.
    pub fn parse(date: Option<&str>, date_time: Option<&str>) -> Result<Option<Self>> {
        let date = date
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                    CalendarError::InvalidArgument(format!(
                        "instanceDate '{s}' is not a YYYY-MM-DD date: {e}"
                    ))
                })
            })
            .transpose()?;

        let date_time = date_time
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                DateTime::parse_from_rfc3339(s).map_err(|e| {
                    CalendarError::InvalidArgument(format!(
                        "instanceDateTime '{s}' is not an ISO 8601 timestamp with offset: {e}"
                    ))
                })
            })
            .transpose()?;

        match (date, date_time) {
            (None, None) => Ok(None),
            (Some(d), Some(dt)) if dt.date_naive() != d => {
                Err(CalendarError::InvalidArgument(format!(
                    "instanceDate {d} contradicts instanceDateTime {dt}"
                )))
            }
            (_, Some(dt)) => Ok(Some(Self::at(dt))),
            (Some(d), None) => Ok(Some(Self::on_date(d))),
        }
    }

    /// The date, when the occurrence was named by date only
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            OccurrenceLocator::Date(d) => Some(*d),
            OccurrenceLocator::DateTime(_) => None,
        }
    }

    pub fn date_time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            OccurrenceLocator::Date(_) => None,
            OccurrenceLocator::DateTime(dt) => Some(*dt),
        }
    }

    /// Key used in the instance identifier
    pub fn occurrence_key(&self) -> OccurrenceKey {
        match self {
            OccurrenceLocator::Date(d) => OccurrenceKey::AllDay(*d),
            OccurrenceLocator::DateTime(dt) => OccurrenceKey::Timed(dt.with_timezone(&Utc)),
        }
    }

    /// Calendar date at which a series is split: the datetime's own local date
    pub fn split_date(&self) -> NaiveDate {
        match self {
            OccurrenceLocator::Date(d) => *d,
            OccurrenceLocator::DateTime(dt) => dt.date_naive(),
        }
    }

    /// Start of an event anchored at this occurrence
    pub fn anchor(&self, time_zone: Option<String>) -> EventDateTime {
        match self {
            OccurrenceLocator::Date(d) => EventDateTime::all_day(*d),
            OccurrenceLocator::DateTime(dt) => EventDateTime::timed(*dt, time_zone),
        }
    }

    pub(crate) fn required(locator: Option<&Self>) -> Result<&Self> {
        locator.ok_or_else(|| CalendarError::InvalidArgument(LOCATOR_REQUIRED.to_string()))
    }
}

impl fmt::Display for OccurrenceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceLocator::Date(d) => write!(f, "{d}"),
            OccurrenceLocator::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// Normalized occurrence stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceKey {
    AllDay(NaiveDate),
    Timed(DateTime<Utc>),
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceKey::AllDay(d) => write!(f, "{}", d.format("%Y%m%d")),
            OccurrenceKey::Timed(dt) => write!(f, "{}", dt.format("%Y%m%dT%H%M%SZ")),
        }
    }
}

/// An event as the API addresses it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventRef {
    /// A standalone event or the master of a series
    Event(String),
    /// One occurrence of a series
    Instance {
        series_id: String,
        occurrence: OccurrenceKey,
    },
}

impl EventRef {
    pub fn event(id: impl Into<String>) -> Self {
        EventRef::Event(id.into())
    }

    /// Id of the standalone event or of the owning series
    pub fn series_id(&self) -> &str {
        match self {
            EventRef::Event(id) => id,
            EventRef::Instance { series_id, .. } => series_id,
        }
    }

    /// Identifier as sent to the API
    pub fn api_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventRef::Event(id) => f.write_str(id),
            EventRef::Instance {
                series_id,
                occurrence,
            } => write!(f, "{series_id}_{occurrence}"),
        }
    }
}

/// Address one occurrence of `series_id`.
///
/// Fails with `InvalidArgument` when the series id is blank or no locator is
/// supplied.
pub fn instance_ref(series_id: &str, locator: Option<&OccurrenceLocator>) -> Result<EventRef> {
    let series_id = series_id.trim();
    if series_id.is_empty() {
        return Err(CalendarError::InvalidArgument(
            "eventId must not be empty".to_string(),
        ));
    }
    let locator = OccurrenceLocator::required(locator)?;

    Ok(EventRef::Instance {
        series_id: series_id.to_string(),
        occurrence: locator.occurrence_key(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(date: Option<&str>, date_time: Option<&str>) -> OccurrenceLocator {
        OccurrenceLocator::parse(date, date_time).unwrap().unwrap()
    }

    #[test]
    fn test_timed_instance_id_is_utc() {
        let loc = locator(None, Some("2024-01-15T10:00:00+09:00"));
        let id = instance_ref("abc123", Some(&loc)).unwrap();
        assert_eq!(id.api_id(), "abc123_20240115T010000Z");
        assert_eq!(id.series_id(), "abc123");
    }

    #[test]
    fn test_all_day_instance_id() {
        let loc = locator(Some("2024-03-01"), None);
        let id = instance_ref("abc123", Some(&loc)).unwrap();
        assert_eq!(id.api_id(), "abc123_20240301");
    }

    #[test]
    fn test_same_instant_in_different_offsets() {
        let tokyo = locator(None, Some("2024-01-15T10:00:00+09:00"));
        let utc = locator(None, Some("2024-01-15T01:00:00Z"));
        let ny = locator(None, Some("2024-01-14T20:00:00-05:00"));
        let a = instance_ref("s", Some(&tokyo)).unwrap();
        assert_eq!(a, instance_ref("s", Some(&utc)).unwrap());
        assert_eq!(a, instance_ref("s", Some(&ny)).unwrap());
    }

    #[test]
    fn test_instance_crossing_utc_date_line() {
        let loc = locator(None, Some("2024-01-01T08:30:00+09:00"));
        let id = instance_ref("s", Some(&loc)).unwrap();
        assert_eq!(id.api_id(), "s_20231231T233000Z");
    }

    #[test]
    fn test_missing_locator_is_invalid_argument() {
        let err = instance_ref("abc123", None).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument(_)));
        assert!(OccurrenceLocator::parse(None, None).unwrap().is_none());
        assert!(OccurrenceLocator::parse(Some(""), Some("  ")).unwrap().is_none());
    }

    #[test]
    fn test_blank_series_id_is_invalid_argument() {
        let loc = locator(Some("2024-03-01"), None);
        assert!(matches!(
            instance_ref("  ", Some(&loc)),
            Err(CalendarError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_malformed_locators_are_rejected() {
        assert!(OccurrenceLocator::parse(Some("2024/03/01"), None).is_err());
        assert!(OccurrenceLocator::parse(None, Some("2024-03-01T10:00:00")).is_err());
    }

    #[test]
    fn test_contradictory_locator_is_rejected() {
        let err = OccurrenceLocator::parse(Some("2024-03-02"), Some("2024-03-01T10:00:00+09:00"))
            .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument(_)));

        // Agreement is judged on the datetime's own local date
        let loc = locator(Some("2024-03-01"), Some("2024-03-01T08:00:00+09:00"));
        assert_eq!(loc.split_date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(loc.date(), None);
        assert_eq!(
            instance_ref("s", Some(&loc)).unwrap().api_id(),
            "s_20240229T230000Z"
        );
    }

    #[test]
    fn test_split_date_uses_local_date_of_datetime() {
        let loc = locator(None, Some("2024-03-01T08:00:00+09:00"));
        assert_eq!(loc.split_date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_anchor_keeps_original_offset() {
        let loc = locator(None, Some("2024-03-01T10:00:00+09:00"));
        let anchor = loc.anchor(Some("Asia/Tokyo".to_string()));
        assert_eq!(anchor.date_time.as_deref(), Some("2024-03-01T10:00:00+09:00"));
        assert_eq!(anchor.date, None);
        assert_eq!(anchor.time_zone.as_deref(), Some("Asia/Tokyo"));

        let all_day = locator(Some("2024-03-01"), None).anchor(Some("Asia/Tokyo".to_string()));
        assert_eq!(all_day, EventDateTime::all_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }
}
