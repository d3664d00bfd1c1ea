//! Progress parsing for FFmpeg's `-progress pipe:2` output.

/// Progress snapshot parsed from the encoder's stderr stream.
#[derive(Debug, Clone, Default)]
pub struct RenderProgress {
    /// Output timestamp in milliseconds
    pub out_time_ms: i64,
    /// Current frame number
    pub frame: u64,
    /// Encoding fps
    pub fps: f64,
    /// Encoding speed (1.0 = realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl RenderProgress {
    /// Output position in seconds.
    pub fn out_time_secs(&self) -> f64 {
        self.out_time_ms as f64 / 1000.0
    }
}

/// Parse one `key=value` progress line, returning a snapshot on the
/// `progress=` terminator that closes each block.
pub fn parse_progress_line(line: &str, current: &mut RenderProgress) -> Option<RenderProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // Despite the name, ffmpeg reports out_time_ms in microseconds.
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    current.fps = fps;
                }
            }
            "speed" => {
                if value != "N/A" {
                    if let Some(speed_str) = value.strip_suffix('x') {
                        if let Ok(speed) = speed_str.parse() {
                            current.speed = speed;
                        }
                    }
                }
            }
            "progress" => {
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}

/// Whether a non-progress stderr line looks like an encoder error worth
/// keeping for the job record. The stream is scanned line by line so the
/// full encoder log is never buffered.
pub fn looks_like_error(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.contains('=') {
        return false;
    }
    let lowered = line.to_lowercase();
    lowered.contains("error")
        || lowered.contains("invalid")
        || lowered.starts_with("conversion failed")
}
