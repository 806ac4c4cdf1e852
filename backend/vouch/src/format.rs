const SECOND: i64 = 1_000;
const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Renders a wait such as `"1d 3h 20m"`. Seconds only show when nothing larger does.
pub fn format_duration(ms: i64) -> String {
    if ms <= 0 {
        return "now".to_string();
    }

    let seconds = ms / SECOND;
    let days = seconds / DAY;
    let hours = (seconds % DAY) / HOUR;
    let minutes = (seconds % HOUR) / MINUTE;

    let parts: Vec<String> = [(days, 'd'), (hours, 'h'), (minutes, 'm')]
        .into_iter()
        .filter(|(value, _)| *value != 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        return format!("{seconds}s");
    }

    parts.join(" ")
}
