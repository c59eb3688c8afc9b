//! Data model shared by the decoders, the selector and the pipeline.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dvd::SizeClass;

/// The kind of disc structure found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscKind {
    BluRay,
    Dvd,
    HdDvd,
}

impl DiscKind {
    /// Recognises the disc layout rooted at `path`.
    ///
    /// Accepts both the disc root (`BDMV/`, `VIDEO_TS/`, `HVDVD_TS/`) and the
    /// structure directory itself.
    pub fn detect(path: &Path) -> Option<DiscKind> {
        if path.join("BDMV").is_dir()
            || (path.join("PLAYLIST").is_dir() && path.join("STREAM").is_dir())
        {
            return Some(DiscKind::BluRay);
        }
        if path.join("VIDEO_TS").is_dir() {
            return Some(DiscKind::Dvd);
        }
        if path.join("HVDVD_TS").is_dir() {
            return Some(DiscKind::HdDvd);
        }

        let names: Vec<String> = fs::read_dir(path)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_uppercase())
            .collect();
        if names.iter().any(|n| n.starts_with("VTS_")) {
            Some(DiscKind::Dvd)
        } else if names.iter().any(|n| n.ends_with(".EVO")) {
            Some(DiscKind::HdDvd)
        } else {
            None
        }
    }

    /// The directory holding the playlist/stream files for this kind.
    pub fn structure_dir(&self, path: &Path) -> PathBuf {
        let sub = match self {
            DiscKind::BluRay => "BDMV",
            DiscKind::Dvd => "VIDEO_TS",
            DiscKind::HdDvd => "HVDVD_TS",
        };
        let dir = path.join(sub);
        if dir.is_dir() {
            dir
        } else {
            path.to_path_buf()
        }
    }
}

/// One physical or logical disc under examination.
///
/// Created once per input path; pipeline stages attach their results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disc {
    /// 0-based position in the batch, used in artifact names.
    pub index: usize,
    pub path: PathBuf,
    pub kind: DiscKind,
    /// Disc size in bytes.
    pub size: u64,
    /// Selected playlists (Blu-ray).
    pub playlists: Vec<PlaylistCandidate>,
    pub reports: Vec<DiscReport>,
    /// Merged MediaInfo text (DVD and HD DVD).
    pub mediainfo: Option<String>,
    /// Size in GiB, rounded to two decimals (DVD).
    pub size_gib: Option<f64>,
    pub size_class: Option<SizeClass>,
    /// Display name of the selected HD DVD title.
    pub title: Option<String>,
}

impl Disc {
    pub fn new(index: usize, path: impl Into<PathBuf>, kind: DiscKind) -> Self {
        Self {
            index,
            path: path.into(),
            kind,
            size: 0,
            playlists: Vec::new(),
            reports: Vec::new(),
            mediainfo: None,
            size_gib: None,
            size_class: None,
            title: None,
        }
    }

    /// Zero-padded disc index, `00` for the first disc.
    pub fn number(&self) -> String {
        format!("{:02}", self.index)
    }
}

/// A stream file referenced by a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRef {
    pub file: PathBuf,
    pub size: u64,
}

/// A chapter position inside a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMark {
    /// Offset from the start of the playlist, in milliseconds.
    pub millis: u64,
    pub name: Option<String>,
}

/// A playlist that may be the main feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistCandidate {
    /// File name of the container or title number.
    pub id: String,
    /// Total duration in seconds.
    pub duration: f64,
    pub clips: Vec<ClipRef>,
    pub path: PathBuf,
    #[serde(default)]
    pub chapters: Vec<ChapterMark>,
}

impl PlaylistCandidate {
    pub fn total_size(&self) -> u64 {
        self.clips.iter().map(|c| c.size).sum()
    }

    /// Whether any stream file is referenced more than once.
    pub fn has_duplicate_clips(&self) -> bool {
        let mut seen = HashSet::new();
        self.clips.iter().any(|c| !seen.insert(&c.file))
    }
}

/// Anything the main feature selector can rank.
pub trait Candidate {
    fn label(&self) -> String;

    /// Duration in seconds.
    fn duration(&self) -> f64;

    /// Sum of the referenced file sizes, in bytes.
    fn total_size(&self) -> u64;

    /// Extra detail shown to an operator choosing between candidates.
    fn description(&self) -> Option<String> {
        None
    }

    /// Candidates that are not clean never get selected.
    fn is_clean(&self) -> bool {
        true
    }
}

impl Candidate for PlaylistCandidate {
    fn label(&self) -> String {
        self.id.clone()
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn total_size(&self) -> u64 {
        PlaylistCandidate::total_size(self)
    }

    fn is_clean(&self) -> bool {
        !self.has_duplicate_clips()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTrack {
    pub codec: String,
    pub bitrate: String,
    pub resolution: String,
    pub frame_rate: String,
    pub aspect_ratio: String,
    pub profile: String,
    pub bit_depth: String,
    pub hdr_format: String,
    pub color: String,
    /// The eye marker of a 3D stream, e.g. `Left Eye`.
    pub stereoscopic: String,
}

impl VideoTrack {
    pub fn is_stereoscopic(&self) -> bool {
        !self.stereoscopic.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub language: String,
    pub codec: String,
    pub channels: String,
    pub sample_rate: String,
    pub bitrate: String,
    pub bit_depth: String,
    /// The object audio marker, e.g. `Atmos Audio`.
    pub object_audio: String,
}

impl AudioTrack {
    pub fn is_object_audio(&self) -> bool {
        !self.object_audio.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub language: String,
}

/// A row of the report's file table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub file: String,
    pub start: String,
    pub length: String,
    pub size: String,
    pub bitrate: String,
}

/// The typed form of one vendor report, one per selected playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscReport {
    pub path: PathBuf,
    pub title: String,
    pub label: String,
    pub playlist: String,
    /// Disc size in GiB.
    pub size: f64,
    pub length: String,
    pub video: Vec<VideoTrack>,
    pub audio: Vec<AudioTrack>,
    pub subtitles: Vec<SubtitleTrack>,
    pub files: Vec<FileEntry>,
    pub summary: String,
    pub extended_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
}
