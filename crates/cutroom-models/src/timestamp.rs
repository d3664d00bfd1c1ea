//! Time formatting shared by the compiler and the subtitle exporters.

/// Format seconds as `HH:MM:SS.mmm` for FFmpeg arguments.
pub fn format_seconds(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u32;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u32;
    let secs = seconds % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}

/// Format seconds as `HH:MM:SS<sep>mmm`, the shared routine behind both
/// subtitle export formats (comma for SRT, dot for VTT).
pub fn format_subtitle_time(seconds: f64, sep: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, sep, ms)
}

/// Parse `HH:MM:SS<sep>mmm` back to seconds.
pub fn parse_subtitle_time(value: &str, sep: char) -> Option<f64> {
    let (clock, ms) = value.rsplit_once(sep)?;
    let ms: u64 = ms.parse().ok()?;

    let mut parts = clock.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let secs: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || secs >= 60 || ms >= 1000 {
        return None;
    }

    Some((hours * 3600 + minutes * 60 + secs) as f64 + ms as f64 / 1000.0)
}

/// Round seconds to two decimal places for persisted values.
pub fn round2(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00.000");
        assert_eq!(format_seconds(90.0), "00:01:30.000");
        assert_eq!(format_seconds(3661.5), "01:01:01.500");
        assert_eq!(format_seconds(-3.0), "00:00:00.000");
    }

    #[test]
    fn test_subtitle_time_separators() {
        assert_eq!(format_subtitle_time(1.5, ','), "00:00:01,500");
        assert_eq!(format_subtitle_time(1.5, '.'), "00:00:01.500");
        assert_eq!(format_subtitle_time(3723.042, '.'), "01:02:03.042");
    }

    #[test]
    fn test_subtitle_time_round_trips_within_10ms() {
        for &t in &[0.0, 0.001, 1.5, 59.999, 61.25, 3599.5, 7000.123] {
            let formatted = format_subtitle_time(t, ',');
            let parsed = parse_subtitle_time(&formatted, ',').unwrap();
            assert!(
                (parsed - t).abs() < 0.010,
                "{} -> {} -> {}",
                t,
                formatted,
                parsed
            );
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_subtitle_time("00:00:01", ',').is_none());
        assert!(parse_subtitle_time("00:61:00,000", ',').is_none());
        assert!(parse_subtitle_time("abc", ',').is_none());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.239), 1.24);
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(3.0), 3.0);
    }
}
