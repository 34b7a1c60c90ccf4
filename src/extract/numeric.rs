//! Locale-tolerant parsing of noisy numeric strings
//!
//! Attribute-table values arrive with grouping spaces, non-breaking spaces,
//! and either comma or dot as the decimal separator, sometimes with a trailing
//! unit. Values outside the documented per-field bounds are treated as
//! unparseable rather than propagated.

/// Valid living-area range in m², exclusive on both ends.
const AREA_MIN_SQM: f64 = 10.0;
const AREA_MAX_SQM: f64 = 1000.0;

/// Room counts at or above this are scrape noise, not apartments.
const MAX_ROOM_COUNT: u32 = 20;

/// Extracts the first numeric run from a noisy string and parses it.
///
/// Grouping spaces (including NBSP) inside the run are dropped. When both `.`
/// and `,` appear, the later one is the decimal separator. A single separator
/// followed by exactly three digits is read as grouping (`1,234` → 1234);
/// anything else is a decimal point (`85,5` → 85.5).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let run = numeric_run(raw);
    if run.is_empty() {
        return None;
    }

    let normalized = match (run.rfind('.'), run.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, grouping) = if dot > comma { ('.', ',') } else { (',', '.') };
            run.chars()
                .filter(|&c| c != grouping)
                .map(|c| if c == decimal { '.' } else { c })
                .collect()
        }
        (Some(_), None) => resolve_single_separator(&run, '.'),
        (None, Some(_)) => resolve_single_separator(&run, ','),
        (None, None) => run,
    };

    normalized.parse().ok()
}

/// Parses a room count, rejecting non-integers and out-of-range values.
/// Returns the normalized integer as a string, ready for the record field.
pub fn parse_room_count(raw: &str) -> Option<String> {
    let value = parse_decimal(raw)?;
    if value.fract() != 0.0 {
        return None;
    }
    let count = value as u32;
    (1..MAX_ROOM_COUNT).contains(&count).then(|| count.to_string())
}

/// Parses an area in m², rejecting values outside (10, 1000).
/// Returns the normalized value as a string, ready for the record field.
pub fn parse_area(raw: &str) -> Option<String> {
    let value = parse_decimal(raw)?;
    (value > AREA_MIN_SQM && value < AREA_MAX_SQM).then(|| format_compact(value))
}

/// Collects the first contiguous numeric run, keeping separators only when a
/// digit follows them and skipping grouping spaces inside the run.
fn numeric_run(raw: &str) -> String {
    let mut out = String::new();
    let mut started = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '0'..='9' => {
                started = true;
                out.push(c);
            }
            '.' | ',' if started => {
                if matches!(chars.peek(), Some('0'..='9')) {
                    out.push(c);
                } else {
                    break;
                }
            }
            ' ' | '\u{a0}' | '\u{202f}' if started => {
                if matches!(chars.peek(), Some('0'..='9')) {
                    continue;
                } else {
                    break;
                }
            }
            _ if started => break,
            _ => continue,
        }
    }

    out
}

fn resolve_single_separator(run: &str, sep: char) -> String {
    if run.matches(sep).count() > 1 {
        // repeated separator can only be grouping
        return run.chars().filter(|&c| c != sep).collect();
    }

    let after = run.rsplit(sep).next().unwrap_or("");
    if after.len() == 3 {
        // exactly three trailing digits reads as a thousands group
        run.chars().filter(|&c| c != sep).collect()
    } else {
        run.replace(sep, ".")
    }
}

fn format_compact(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
