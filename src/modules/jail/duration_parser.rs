use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([mhd])$").expect("duration pattern is valid"));

/// Parses `<count><unit>` where unit is `m`, `h` or `d` (e.g. `10m`, `5h`, `30d`).
///
/// Anything else, including surrounding whitespace, signs or a missing
/// unit, yields `None`. A zero count parses; callers decide whether an
/// empty jail makes sense.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let cap = DURATION_RE.captures(s)?;
    let value: i64 = cap[1].parse().ok()?;

    let millis_per_unit: i64 = match &cap[2] {
        "m" => 60 * 1000,
        "h" => 60 * 60 * 1000,
        "d" => 24 * 60 * 60 * 1000,
        _ => return None,
    };

    Duration::try_milliseconds(value.checked_mul(millis_per_unit)?)
}
