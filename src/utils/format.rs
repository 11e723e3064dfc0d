/// Render milliseconds as `HH:MM:SS`, truncating sub-second precision.
/// Hours are not wrapped, so 100 hours renders as `100:00:00`.
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
