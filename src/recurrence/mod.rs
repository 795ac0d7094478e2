//! Recurring-event editing
//!
//! - [`instance`]: addressing single occurrences (`<seriesId>_<stamp>`)
//! - [`rrule`]: stripping and installing UNTIL/COUNT bounds on RRULE text
//! - [`scope`]: applying an edit to one occurrence, the whole series, or an
//!   occurrence and all that follow it

pub mod instance;
pub mod rrule;
pub mod scope;

pub use instance::{instance_ref, EventRef, OccurrenceKey, OccurrenceLocator};
pub use rrule::{strip_bounds, truncate_before, until_before};
pub use scope::{
    continuation_body, delete_instance, update_scoped, EditScope, EventUpdate, ScopedUpdate,
    SeriesSplit,
};
