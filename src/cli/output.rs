//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::{PlayerConfig, StreamDescriptor, SubtitleMap};
use crate::utils::{codecs, ext_from_mime};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Output formatter for rytex
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
}

impl OutputFormatter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    fn quiet(&self) -> bool {
        self.verbosity == VerbosityLevel::Quiet
    }

    /// Spinner shown while a stage is running; hidden in quiet mode
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.quiet() {
            return ProgressBar::hidden();
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if !self.quiet() {
            println!("ℹ️  {}", message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet() {
            eprintln!("⚠️  {}", message);
        }
    }

    /// Print the video summary and its stream catalog
    pub fn print_video_info(&self, config: &PlayerConfig) {
        if self.quiet() {
            return;
        }
        for line in summary_lines(config) {
            println!("{}", line);
        }
    }

    /// Print subtitle languages and line counts
    pub fn print_subtitles(&self, subtitles: &SubtitleMap) {
        if self.quiet() {
            return;
        }
        if subtitles.is_empty() {
            println!("💬 No subtitles");
            return;
        }

        let mut languages: Vec<_> = subtitles.iter().collect();
        languages.sort_by(|a, b| a.0.cmp(b.0));
        for (lang, lines) in languages {
            println!("💬 {}: {} lines", lang, lines.len());
        }
    }

    /// Print elapsed time of the run
    pub fn print_elapsed(&self, elapsed: Duration) {
        let rounded = Duration::from_millis(elapsed.as_millis() as u64);
        self.info(&format!("Done in {}", humantime::format_duration(rounded)));
    }
}

/// Human-readable summary of a player config
pub fn summary_lines(config: &PlayerConfig) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(details) = &config.video_details {
        lines.push(format!(
            "📹 {}",
            details.title.as_deref().unwrap_or("(untitled)")
        ));
        if let Some(author) = &details.author {
            lines.push(format!("👤 {}", author));
        }
        if let Some(seconds) = details.length_seconds {
            lines.push(format!(
                "⏱️  {}",
                humantime::format_duration(Duration::from_secs(seconds))
            ));
        }
    }

    let Some(streaming) = &config.streaming_data else {
        lines.push("📊 No streaming data".to_string());
        return lines;
    };

    if let Some(hls) = &streaming.hls_manifest_url {
        lines.push(format!("📡 HLS manifest: {}", hls));
    }
    if let Some(dash) = &streaming.dash_manifest_url {
        lines.push(format!("📡 DASH manifest: {}", dash));
    }

    let muxed = config.muxed_formats();
    let sections = [
        ("Muxed", muxed),
        ("Video", streaming.video_streams.as_slice()),
        ("Audio", streaming.audio_streams.as_slice()),
    ];
    for (label, streams) in sections {
        if streams.is_empty() {
            continue;
        }
        lines.push(format!("📊 {} streams: {}", label, streams.len()));
        lines.extend(streams.iter().map(stream_line));
    }

    lines
}

/// One line describing a stream descriptor
pub fn stream_line(stream: &StreamDescriptor) -> String {
    let quality = stream
        .quality_label
        .as_deref()
        .or(stream.audio_quality.as_deref())
        .or(stream.quality.as_deref())
        .unwrap_or("-");
    let codecs = codecs(stream.mime()).join(",");
    let size = stream
        .content_length
        .map(|s| format!(" ({})", format_bytes(s)))
        .unwrap_or_default();

    format!(
        "  📋 itag={} | {} | {} [{}] | {} kbps{}",
        stream.itag.map_or_else(|| "?".to_string(), |i| i.to_string()),
        quality,
        ext_from_mime(stream.mime()),
        codecs,
        stream.bitrate.unwrap_or(0) / 1000,
        size
    )
}

/// Format bytes as human-readable string
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = ((bytes_f64.ln() / THRESHOLD.ln()).floor() as usize).min(UNITS.len() - 1);
    if exp == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", bytes_f64 / THRESHOLD.powi(exp as i32), UNITS[exp])
    }
}
