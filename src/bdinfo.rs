//! BDInfo report parsing.
//!
//! A BDInfo scan produces a long text file. Three parts of it matter here:
//! the quick summary (`Disc Title:`, `Video:`, `Audio:` lines and friends),
//! the extended summary in the second `[code]` block, and the `FILES:` table.
//! [`BdInfoOutput::split`] cuts the file apart, [`parse`] turns a quick
//! summary into a [`DiscReport`].

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::BdInfoSettings;
use crate::types::{AudioTrack, DiscReport, FileEntry, SubtitleTrack, VideoTrack};
use crate::{Error, Result};

const GIB: f64 = (1u64 << 30) as f64;

/// Slash separated track fields with an optional marker slot.
///
/// When the marker is present every field from the marker slot on moves one
/// position to the right. Fields are only read through [`Fields::shifted`] so
/// a missing marker never pulls a neighbouring value into the wrong field.
struct Fields<'a> {
    parts: Vec<&'a str>,
    shift: usize,
}

impl<'a> Fields<'a> {
    fn new(value: &'a str, marker_slot: usize, marker: &str) -> Self {
        let parts: Vec<&str> = value.split('/').map(str::trim).collect();
        let shift = match parts.get(marker_slot) {
            Some(p) if p.contains(marker) => 1,
            _ => 0,
        };
        Self { parts, shift }
    }

    fn at(&self, slot: usize) -> String {
        self.parts.get(slot).copied().unwrap_or_default().to_string()
    }

    fn shifted(&self, slot: usize) -> String {
        self.at(slot + self.shift)
    }

    fn marker(&self, slot: usize) -> String {
        if self.shift == 1 {
            self.at(slot)
        } else {
            String::new()
        }
    }
}

fn video_track(value: &str) -> VideoTrack {
    let f = Fields::new(value, 2, "Eye");
    VideoTrack {
        codec: f.at(0),
        bitrate: f.at(1),
        stereoscopic: f.marker(2),
        resolution: f.shifted(2),
        frame_rate: f.shifted(3),
        aspect_ratio: f.shifted(4),
        profile: f.shifted(5),
        bit_depth: f.shifted(6),
        hdr_format: f.shifted(7),
        color: f.shifted(8),
    }
}

fn audio_track(value: &str) -> AudioTrack {
    let f = Fields::new(value, 2, "Atmos");
    AudioTrack {
        language: f.at(0),
        codec: f.at(1),
        object_audio: f.marker(2),
        channels: f.shifted(2),
        sample_rate: f.shifted(3),
        bitrate: f.shifted(4),
        bit_depth: f.shifted(5),
    }
}

fn disc_size_gib(value: &str) -> f64 {
    let bytes = value.split("bytes").next().unwrap_or_default().replace(',', "");
    match bytes.trim().parse::<f64>() {
        Ok(bytes) => bytes / GIB,
        Err(_) => {
            warn!(value = value.trim(), "Unparsable disc size");
            0.0
        }
    }
}

fn before_dot(value: &str) -> String {
    value.split('.').next().unwrap_or_default().trim().to_string()
}

/// Parse a BDInfo quick summary.
///
/// Fails only if one of the `PLAYLIST:`, `DISC SIZE:` or `LENGTH:` lines is
/// missing altogether; track fields that cannot be read are left empty.
pub fn parse(raw: &str) -> Result<DiscReport> {
    let mut report = DiscReport::default();
    let (mut has_playlist, mut has_size, mut has_length) = (false, false, false);

    for line in raw.lines() {
        let content = line.trim().trim_start_matches('*').trim();
        let Some((key, value)) = content.split_once(':') else {
            continue;
        };

        match key.trim().to_lowercase().as_str() {
            "playlist" => {
                has_playlist = true;
                report.playlist = before_dot(value);
            }
            "disc size" => {
                has_size = true;
                report.size = disc_size_gib(value);
            }
            "length" => {
                has_length = true;
                report.length = before_dot(value);
            }
            "disc title" => report.title = value.trim().to_string(),
            "disc label" => report.label = value.trim().to_string(),
            "video" => report.video.push(video_track(value)),
            "audio" => {
                // trailing "(AC3 Embedded: ...)" style comments
                let value = value.split('(').next().unwrap_or_default();
                report.audio.push(audio_track(value));
            }
            "subtitle" => report.subtitles.push(SubtitleTrack {
                language: value.split('/').next().unwrap_or_default().trim().to_string(),
            }),
            _ => {}
        }
    }

    for (present, marker) in [
        (has_playlist, "PLAYLIST:"),
        (has_size, "DISC SIZE:"),
        (has_length, "LENGTH:"),
    ] {
        if !present {
            return Err(Error::MalformedReport(format!("missing {} line", marker)));
        }
    }

    debug!(
        playlist = %report.playlist,
        video = report.video.len(),
        audio = report.audio.len(),
        subtitles = report.subtitles.len(),
        "Parsed BDInfo summary"
    );
    Ok(report)
}

/// Parse the rows of a `FILES:` table.
///
/// Header and underline rows and lines with fewer than five columns are
/// skipped. A `(1)` style disambiguator after the file name belongs to the
/// name.
pub fn parse_files(block: &str) -> Vec<FileEntry> {
    let mut files = Vec::new();
    for line in block.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 5 || tokens[0] == "Name" || tokens[0].starts_with("---") {
            continue;
        }

        let (file, columns) = if tokens[1].starts_with('(') && tokens[1].contains(')') {
            (format!("{} {}", tokens[0], tokens[1]), &tokens[2..])
        } else {
            (tokens[0].to_string(), &tokens[1..])
        };
        let [start, length, size, bitrate, ..] = columns else {
            debug!(line, "Skipping short file row");
            continue;
        };

        files.push(FileEntry {
            file,
            start: start.to_string(),
            length: length.to_string(),
            size: size.to_string(),
            bitrate: bitrate.to_string(),
        });
    }
    files
}

/// The parts of a full BDInfo report file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BdInfoOutput {
    pub summary: String,
    pub extended_summary: String,
    pub files: String,
}

impl BdInfoOutput {
    pub fn split(text: &str) -> Result<Self> {
        let (head, quick) = text
            .split_once("QUICK SUMMARY:")
            .ok_or_else(|| Error::MalformedReport("missing QUICK SUMMARY: block".to_string()))?;
        let summary = quick
            .split("********************")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let extended_summary = text
            .splitn(4, "[code]")
            .nth(2)
            .and_then(|block| block.split("FILES:").next())
            .unwrap_or_default()
            .trim()
            .to_string();

        let files = head
            .split_once("FILES:")
            .map(|(_, rest)| rest.split("CHAPTERS:").next().unwrap_or_default())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            summary,
            extended_summary,
            files,
        })
    }
}

/// Split a full report and parse it.
pub fn parse_output(text: &str, disc_path: &Path) -> Result<DiscReport> {
    let output = BdInfoOutput::split(text)?;
    let mut report = parse(&output.summary)?;
    report.path = disc_path.to_path_buf();
    report.files = parse_files(&output.files);
    report.summary = output.summary;
    report.extended_summary = output.extended_summary;
    Ok(report)
}

/// The newest `BDINFO*.txt` file in `dir`.
pub fn locate_newest_report(dir: &Path) -> Result<Option<PathBuf>> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !(name.starts_with("BDINFO") && name.ends_with(".txt")) {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let path = entry.path();
        let is_newer = match &newest {
            None => true,
            Some((time, current)) => modified > *time || (modified == *time && path > *current),
        };
        if is_newer {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Something that writes a BDInfo report for one playlist into a directory.
pub trait ReportGenerator {
    fn generate(&self, disc_path: &Path, playlist: &str, out_dir: &Path) -> Result<()>;
}

/// Runs `BDInfo.exe`, directly on Windows and through `mono` elsewhere.
#[derive(Debug, Clone)]
pub struct BdInfoCli {
    pub executable: PathBuf,
    pub use_mono: bool,
}

impl BdInfoCli {
    pub fn from_settings(settings: &BdInfoSettings) -> Self {
        Self {
            executable: settings.executable.clone(),
            use_mono: settings.use_mono,
        }
    }

    /// Program and arguments. The mono build takes the disc path first, the
    /// Windows build after the playlist switch.
    pub fn command_line(
        &self,
        disc_path: &Path,
        playlist: &str,
        out_dir: &Path,
    ) -> (OsString, Vec<OsString>) {
        if self.use_mono {
            (
                OsString::from("mono"),
                vec![
                    self.executable.clone().into_os_string(),
                    disc_path.as_os_str().to_owned(),
                    OsString::from("-m"),
                    OsString::from(playlist),
                    out_dir.as_os_str().to_owned(),
                ],
            )
        } else {
            (
                self.executable.clone().into_os_string(),
                vec![
                    OsString::from("-m"),
                    OsString::from(playlist),
                    disc_path.as_os_str().to_owned(),
                    out_dir.as_os_str().to_owned(),
                ],
            )
        }
    }
}

impl ReportGenerator for BdInfoCli {
    fn generate(&self, disc_path: &Path, playlist: &str, out_dir: &Path) -> Result<()> {
        let (program, args) = self.command_line(disc_path, playlist, out_dir);
        debug!(?program, ?args, "Running BDInfo");

        let status = Command::new(&program)
            .args(&args)
            .status()
            .map_err(|e| Error::external_tool("BDInfo", e.to_string()))?;
        if !status.success() {
            // the report, if any, is still picked up from out_dir
            warn!(%status, playlist, "BDInfo exited unsuccessfully");
        }
        Ok(())
    }
}
