//! Caller-facing subtitle export in SRT and WebVTT.

use crate::subtitle::SubtitleSegment;
use crate::timestamp::format_subtitle_time;

/// Export segments as SubRip text: numeric cue indices and comma
/// millisecond separators.
pub fn to_srt(segments: &[SubtitleSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_subtitle_time(segment.start, ','),
            format_subtitle_time(segment.end, ','),
            segment.text.trim()
        ));
    }
    out
}

/// Export segments as WebVTT: fixed header and dot millisecond separators.
pub fn to_vtt(segments: &[SubtitleSegment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in segments {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_subtitle_time(segment.start, '.'),
            format_subtitle_time(segment.end, '.'),
            segment.text.trim()
        ));
    }
    out
}
