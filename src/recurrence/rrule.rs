//! Text-level edits of RRULE lines
//!
//! Rules are never interpreted here; only the `UNTIL` and `COUNT` parts are
//! removed or installed. Lines that are not RRULEs (EXDATE, RDATE, ...) pass
//! through unchanged.

use chrono::NaiveDate;

const RRULE_PREFIX: &str = "RRULE:";

fn is_rrule(line: &str) -> bool {
    line.get(..RRULE_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(RRULE_PREFIX))
}

fn is_bound(part: &str) -> bool {
    let key = part.split('=').next().unwrap_or_default().trim();
    key.eq_ignore_ascii_case("UNTIL") || key.eq_ignore_ascii_case("COUNT")
}

/// Remove any `UNTIL=` and `COUNT=` parts from a single RRULE line
pub fn strip_bounds_line(line: &str) -> String {
    if !is_rrule(line) {
        return line.to_string();
    }
    let (prefix, body) = line.split_at(RRULE_PREFIX.len());
    let kept: Vec<&str> = body
        .split(';')
        .filter(|part| !part.is_empty() && !is_bound(part))
        .collect();
    format!("{prefix}{}", kept.join(";"))
}

/// Remove every `UNTIL`/`COUNT` bound, leaving an open-ended rule set
pub fn strip_bounds(rules: &[String]) -> Vec<String> {
    rules.iter().map(|r| strip_bounds_line(r)).collect()
}

/// UNTIL value that ends a series just before `split_date`: the last second
/// of the preceding day, in UTC
pub fn until_before(split_date: NaiveDate) -> String {
    let last_day = split_date.pred_opt().unwrap_or(NaiveDate::MIN);
    format!("{}T235959Z", last_day.format("%Y%m%d"))
}

/// Bound every RRULE so the series ends strictly before `split_date`.
///
/// Existing bounds are stripped first, so applying this twice with the same
/// date gives the same result as applying it once.
pub fn truncate_before(rules: &[String], split_date: NaiveDate) -> Vec<String> {
    let until = until_before(split_date);
    rules
        .iter()
        .map(|rule| {
            if !is_rrule(rule) {
                return rule.clone();
            }
            let stripped = strip_bounds_line(rule);
            if stripped.len() == RRULE_PREFIX.len() {
                format!("{stripped}UNTIL={until}")
            } else {
                format!("{stripped};UNTIL={until}")
            }
        })
        .collect()
}

/// Whether `line` is an RRULE carrying a part named `key`
#[cfg(test)]
pub(crate) fn has_part(line: &str, key: &str) -> bool {
    is_rrule(line)
        && line[RRULE_PREFIX.len()..]
            .split(';')
            .any(|part| part.split('=').next().is_some_and(|k| k.trim().eq_ignore_ascii_case(key)))
}
