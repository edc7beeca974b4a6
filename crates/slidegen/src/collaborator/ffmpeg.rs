use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{AudioExtractor, CollaboratorError};
use crate::config::FfmpegConfig;
use crate::sanitize::redact_path;

static RE_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: (\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap());

/// Lines of ffmpeg stderr kept in error details.
const STDERR_TAIL_LINES: usize = 8;

/// Extracts audio by shelling out to the `ffmpeg` binary.
pub struct FfmpegExtractor {
    binary: PathBuf,
    sample_rate: u32,
}

impl FfmpegExtractor {
    pub fn new<P: AsRef<Path>>(binary: P, sample_rate: u32) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            sample_rate,
        }
    }

    pub fn from_config(config: &FfmpegConfig) -> Self {
        Self::new(&config.binary, config.sample_rate)
    }

    fn command(&self, video: &Path, audio_out: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-hide_banner")
            .arg("-nostdin")
            // never overwrite an existing artifact
            .arg("-n")
            .arg("-i")
            .arg(video)
            .args(["-vn", "-ac", "1", "-ar"])
            .arg(self.sample_rate.to_string())
            .args(["-f", "wav"])
            .arg(audio_out)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), CollaboratorError> {
        let start = Instant::now();
        let output = self
            .command(video, audio_out)
            .output()
            .await
            .map_err(|e| {
                CollaboratorError::io(format!("Failed to run {}", self.binary.display()), e)
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(
                video = %redact_path(video),
                code = ?output.status.code(),
                "ffmpeg failed"
            );
            return Err(CollaboratorError::ProcessFailed {
                program: "ffmpeg".to_string(),
                code: output.status.code(),
                stderr: stderr_tail(&stderr, STDERR_TAIL_LINES),
            });
        }

        debug!(
            video = %redact_path(video),
            media_secs = parse_duration_secs(&stderr),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Audio extracted"
        );
        Ok(())
    }
}

/// Last `lines` non-empty lines of stderr, joined with `" | "`.
fn stderr_tail(stderr: &str, lines: usize) -> String {
    let kept: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let skip = kept.len().saturating_sub(lines);
    kept[skip..].join(" | ")
}

/// Source media duration from ffmpeg's input banner.
fn parse_duration_secs(stderr: &str) -> Option<f64> {
    let caps = RE_DURATION.captures(stderr)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_arguments() {
        let extractor = FfmpegExtractor::new("ffmpeg", 16000);
        let cmd = extractor.command(Path::new("/in/a.mp4"), Path::new("/out/a.wav"));
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "-hide_banner", "-nostdin", "-n", "-i", "/in/a.mp4", "-vn", "-ac", "1", "-ar",
                "16000", "-f", "wav", "/out/a.wav"
            ]
        );
        assert_eq!(cmd.as_std().get_program(), "ffmpeg");
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = "line1\n\nline2\nline3\n  \nline4\n";
        assert_eq!(stderr_tail(stderr, 2), "line3 | line4");
        assert_eq!(stderr_tail(stderr, 10), "line1 | line2 | line3 | line4");
        assert_eq!(stderr_tail("", 3), "");
    }

    #[test]
    fn test_parse_duration() {
        let stderr = "Input #0, mov,mp4\n  Duration: 00:01:30.50, start: 0.000000, bitrate: 128 kb/s";
        assert_eq!(parse_duration_secs(stderr), Some(90.5));
        assert_eq!(parse_duration_secs("no banner"), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let extractor = FfmpegExtractor::new("/nonexistent/slidegen-ffmpeg", 16000);
        let err = extractor
            .extract_audio(Path::new("in.mp4"), Path::new("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Io { .. }));
    }
}
