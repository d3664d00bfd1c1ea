//! Structured FFmpeg command builder.
//!
//! The command is modeled as typed parts — input declarations with their own
//! pre-`-i` arguments, named filter stages, explicit stream mappings and
//! output flags — and only serialized to argv at the boundary in
//! [`FfmpegCommand::build_args`]. Nothing here executes anything.

use std::path::{Path, PathBuf};

/// One input file declaration, with arguments applied before its `-i`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub args: Vec<String>,
}

/// One named filter node: labeled input streams, the filter expression and
/// the labeled output stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStage {
    pub inputs: Vec<String>,
    pub filter: String,
    pub output: String,
}

impl FilterStage {
    pub fn new(inputs: Vec<String>, filter: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            inputs,
            filter: filter.into(),
            output: output.into(),
        }
    }

    /// Serialize as a filtergraph node: `[in0][in1]filter[out]`.
    fn render(&self) -> String {
        let mut rendered = String::new();
        for input in &self.inputs {
            rendered.push_str(&format!("[{}]", input));
        }
        rendered.push_str(&self.filter);
        rendered.push_str(&format!("[{}]", self.output));
        rendered
    }
}

/// Builder for a single FFmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<InputSpec>,
    stages: Vec<FilterStage>,
    maps: Vec<String>,
    output_args: Vec<String>,
    output: PathBuf,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            stages: Vec::new(),
            maps: Vec::new(),
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Declare an input file, returning its stream index.
    pub fn input(&mut self, path: impl AsRef<Path>) -> usize {
        self.input_with_args(path, Vec::<String>::new())
    }

    /// Declare an input file with arguments applied before its `-i`
    /// (e.g. trim flags on the main video), returning its stream index.
    pub fn input_with_args<I, S>(&mut self, path: impl AsRef<Path>, args: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(InputSpec {
            path: path.as_ref().to_path_buf(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self.inputs.len() - 1
    }

    /// Append filter stages to the graph.
    pub fn stages<I>(&mut self, stages: I) -> &mut Self
    where
        I: IntoIterator<Item = FilterStage>,
    {
        self.stages.extend(stages);
        self
    }

    /// Map a labeled filtergraph output (e.g. `vout` becomes `-map [vout]`).
    pub fn map_label(&mut self, label: impl AsRef<str>) -> &mut Self {
        self.maps.push(format!("[{}]", label.as_ref()));
        self
    }

    /// Map a raw stream specifier verbatim (e.g. `0:v` or the tolerant
    /// `0:a?` when a source may lack audio).
    pub fn map_stream(&mut self, spec: impl Into<String>) -> &mut Self {
        self.maps.push(spec.into());
        self
    }

    /// Append output arguments (after inputs and mappings).
    pub fn output_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set log level.
    pub fn log_level(&mut self, level: impl Into<String>) -> &mut Self {
        self.log_level = level.into();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn filter_stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn has_filters(&self) -> bool {
        !self.stages.is_empty()
    }

    /// Serialize the whole filtergraph (`;`-joined stages).
    pub fn filter_graph(&self) -> Option<String> {
        if self.stages.is_empty() {
            return None;
        }
        Some(
            self.stages
                .iter()
                .map(FilterStage::render)
                .collect::<Vec<_>>()
                .join(";"),
        )
    }

    /// Build the full argv for the invocation.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        if let Some(graph) = self.filter_graph() {
            args.push("-filter_complex".to_string());
            args.push(graph);
        }

        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Escape a path for use inside a filter expression (e.g. `ass=...`).
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(normalized.len() + 8);
    for ch in normalized.chars() {
        match ch {
            ':' => escaped.push_str("\\:"),
            '\'' => escaped.push_str("\\'"),
            ',' => escaped.push_str("\\,"),
            '[' => escaped.push_str("\\["),
            ']' => escaped.push_str("\\]"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_keep_declaration_order_and_args() {
        let mut cmd = FfmpegCommand::new("out.mp4");
        let main = cmd.input_with_args("in.mp4", ["-ss", "00:00:05.000", "-t", "00:00:10.000"]);
        let overlay = cmd.input("logo.png");
        assert_eq!(main, 0);
        assert_eq!(overlay, 1);

        let args = cmd.build_args();
        let first_i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[first_i - 4], "-ss");
        assert_eq!(args[first_i + 1], "in.mp4");

        let second_i = args.iter().rposition(|a| a == "-i").unwrap();
        assert_eq!(args[second_i + 1], "logo.png");
    }

    #[test]
    fn test_filter_graph_serialization() {
        let mut cmd = FfmpegCommand::new("out.mp4");
        cmd.input("in.mp4");
        cmd.stages([
            FilterStage::new(vec!["0:v".into()], "hue=h=90", "v1"),
            FilterStage::new(vec!["v1".into(), "1:v".into()], "overlay=0:0", "v2"),
        ]);
        assert_eq!(
            cmd.filter_graph().unwrap(),
            "[0:v]hue=h=90[v1];[v1][1:v]overlay=0:0[v2]"
        );
    }

    #[test]
    fn test_no_filter_complex_for_empty_graph() {
        let mut cmd = FfmpegCommand::new("out.mp4");
        cmd.input("in.mp4");
        let args = cmd.build_args();
        assert!(!args.contains(&"-filter_complex".to_string()));
        assert!(cmd.filter_graph().is_none());
    }

    #[test]
    fn test_maps_and_output_args_order() {
        let mut cmd = FfmpegCommand::new("out.mp4");
        cmd.input("in.mp4");
        cmd.map_label("vout");
        cmd.map_stream("0:a?");
        cmd.output_args(["-c:v", "libx264"]);

        let args = cmd.build_args();
        let map_positions: Vec<usize> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-map")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(args[map_positions[0] + 1], "[vout]");
        assert_eq!(args[map_positions[1] + 1], "0:a?");

        let codec = args.iter().position(|a| a == "-c:v").unwrap();
        assert!(codec > map_positions[1]);
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_preamble_requests_progress_on_stderr() {
        let mut cmd = FfmpegCommand::new("out.mp4");
        cmd.input("in.mp4");
        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        let progress = args.iter().position(|a| a == "-progress").unwrap();
        assert_eq!(args[progress + 1], "pipe:2");
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new("/tmp/a'b,c[d].ass")),
            "/tmp/a\\'b\\,c\\[d\\].ass"
        );
        assert_eq!(escape_filter_path(Path::new("C:\\media\\t.ass")), "C\\:/media/t.ass");
    }
}
