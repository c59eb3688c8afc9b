//! HD DVD playlist (XPL) decoding and title candidates.
//!
//! Titles are read from the advanced content playlist in `ADV_OBJ/`. Every
//! element lookup goes through [`ElementFinder`], so playlists with the
//! standard namespace, without one, or with vendor specific nesting decode
//! the same way.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::language;
use crate::select::DEFAULT_MIN_DURATION;
use crate::types::{Candidate, ChapterMark, ClipRef};
use crate::xml::{attr, ElementFinder};
use crate::Result;

/// Frame rate of HD DVD title timecodes.
const FRAMES_PER_SECOND: u64 = 24;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub number: String,
    pub id: String,
    pub description: String,
    /// `HH:MM:SS:FF` timecode.
    pub duration: String,
    pub display_name: String,
    pub on_end: String,
    pub alternative_sd_display_mode: String,
    pub primary_clips: Vec<PrimaryClip>,
    pub chapters: Vec<Chapter>,
    pub audio_tracks: Vec<NavTrack>,
    pub subtitle_tracks: Vec<NavTrack>,
    pub application_segments: Vec<ApplicationSegment>,
}

impl Title {
    pub fn duration_secs(&self) -> f64 {
        timecode_seconds(&self.duration)
    }

    /// Chapter marks in playlist time; chapters with a malformed timecode are
    /// left out.
    pub fn chapter_marks(&self) -> Vec<ChapterMark> {
        self.chapters
            .iter()
            .filter_map(|c| {
                Some(ChapterMark {
                    millis: timecode_millis(&c.title_time_begin)?,
                    name: Some(c.display_name.clone()).filter(|n| !n.is_empty()),
                })
            })
            .collect()
    }

    /// `(track number, language name)` of the navigation audio tracks.
    pub fn audio_languages(&self) -> Vec<(u32, String)> {
        nav_languages(&self.audio_tracks)
    }

    pub fn subtitle_languages(&self) -> Vec<(u32, String)> {
        nav_languages(&self.subtitle_tracks)
    }
}

fn nav_languages(tracks: &[NavTrack]) -> Vec<(u32, String)> {
    tracks
        .iter()
        .filter(|t| !t.language.is_empty())
        .map(|t| (t.track.trim().parse().unwrap_or(1), t.language.clone()))
        .collect()
}

/// A `PrimaryAudioVideoClip` reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryClip {
    /// Usually a `.MAP` file next to the `.EVO` it describes.
    pub src: String,
    pub title_time_begin: String,
    pub title_time_end: String,
    pub seamless: String,
    pub audio_tracks: Vec<ClipTrack>,
    pub subtitle_tracks: Vec<ClipTrack>,
}

impl PrimaryClip {
    /// File name of the video object this clip plays.
    pub fn evo_file_name(&self) -> String {
        let name = self.src.rsplit(['/', '\\']).next().unwrap_or_default();
        name.replace(".MAP", ".EVO")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipTrack {
    pub track: String,
    pub stream_number: String,
    pub media_attr: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub display_name: String,
    pub title_time_begin: String,
}

/// An entry of the title's `TrackNavigationList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavTrack {
    pub track: String,
    /// Normalized language code.
    pub langcode: String,
    /// Display name of `langcode`.
    pub language: String,
    pub description: String,
    pub selectable: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSegment {
    pub src: String,
    pub title_time_begin: String,
    pub title_time_end: String,
    pub sync: String,
    pub z_order: String,
    pub resources: Vec<ApplicationResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationResource {
    pub src: String,
    pub size: String,
    pub priority: String,
    pub multiplexed: String,
}

fn split_timecode(timecode: &str) -> Option<[u64; 4]> {
    let parts: Vec<u64> = timecode
        .trim()
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [h, m, s, f] => Some([*h, *m, *s, *f]),
        _ => None,
    }
}

/// Whole seconds and frames of a timecode, `None` on overflow.
fn timecode_parts(timecode: &str) -> Option<(u64, u64)> {
    let [h, m, s, f] = split_timecode(timecode)?;
    let secs = h
        .checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)?;
    Some((secs, f))
}

/// Seconds of an `HH:MM:SS:FF` timecode, zero when malformed.
pub fn timecode_seconds(timecode: &str) -> f64 {
    match timecode_parts(timecode) {
        Some((secs, f)) => secs as f64 + f as f64 / FRAMES_PER_SECOND as f64,
        None => 0.0,
    }
}

pub fn timecode_millis(timecode: &str) -> Option<u64> {
    let (secs, f) = timecode_parts(timecode)?;
    secs.checked_mul(1000)?
        .checked_add(f.checked_mul(1000)? / FRAMES_PER_SECOND)
}

/// Human readable duration, e.g. `2 h 5 min`.
pub fn format_duration(timecode: &str) -> String {
    let Some([hours, minutes, _, _]) = split_timecode(timecode) else {
        return "Unknown duration".to_string();
    };

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{} h ", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{} min", minutes));
    }
    out.trim().to_string()
}

/// Parse the titles of an XPL file.
pub fn parse(path: &Path) -> Result<Vec<Title>> {
    parse_with(path, DEFAULT_MIN_DURATION)
}

/// Like [`parse`], with a custom minimum title duration in seconds.
pub fn parse_with(path: &Path, min_duration: f64) -> Result<Vec<Title>> {
    let content = fs::read_to_string(path)?;
    parse_str_with(&content, min_duration)
}

/// Parse XPL content; titles shorter than ten minutes are dropped.
pub fn parse_str(xml: &str) -> Result<Vec<Title>> {
    parse_str_with(xml, DEFAULT_MIN_DURATION)
}

pub fn parse_str_with(xml: &str, min_duration: f64) -> Result<Vec<Title>> {
    let doc = Document::parse(xml)?;
    let finder = ElementFinder::for_document(&doc);

    let mut titles = Vec::new();
    for node in finder.find_all(doc.root_element(), "TitleSet/Title") {
        let title = parse_title(&finder, node);
        if title.duration_secs() < min_duration {
            debug!(
                title = %title.number,
                duration = %title.duration,
                "Skipping short title"
            );
            continue;
        }
        titles.push(title);
    }

    debug!(count = titles.len(), "Parsed HD DVD titles");
    Ok(titles)
}

fn parse_title(finder: &ElementFinder, node: Node) -> Title {
    let primary_clips = finder
        .find_all(node, "PrimaryAudioVideoClip")
        .into_iter()
        .map(|clip| PrimaryClip {
            src: attr(&clip, "src"),
            title_time_begin: attr(&clip, "titleTimeBegin"),
            title_time_end: attr(&clip, "titleTimeEnd"),
            seamless: attr(&clip, "seamless"),
            audio_tracks: clip_tracks(finder, clip, "Audio"),
            subtitle_tracks: clip_tracks(finder, clip, "Subtitle"),
        })
        .collect();

    let chapters = finder
        .find_all(node, "ChapterList/Chapter")
        .into_iter()
        .map(|c| Chapter {
            display_name: attr(&c, "displayName"),
            title_time_begin: c
                .attribute("titleTimeBegin")
                .unwrap_or("00:00:00:00")
                .to_string(),
        })
        .collect();

    let application_segments = finder
        .find_all(node, "ApplicationSegment")
        .into_iter()
        .map(|seg| ApplicationSegment {
            src: attr(&seg, "src"),
            title_time_begin: attr(&seg, "titleTimeBegin"),
            title_time_end: attr(&seg, "titleTimeEnd"),
            sync: attr(&seg, "sync"),
            z_order: attr(&seg, "zOrder"),
            resources: finder
                .find_all(seg, "ApplicationResource")
                .into_iter()
                .map(|res| ApplicationResource {
                    src: attr(&res, "src"),
                    size: attr(&res, "size"),
                    priority: attr(&res, "priority"),
                    multiplexed: attr(&res, "multiplexed"),
                })
                .collect(),
        })
        .collect();

    Title {
        number: attr(&node, "titleNumber"),
        id: attr(&node, "id"),
        description: attr(&node, "description"),
        duration: node
            .attribute("titleDuration")
            .unwrap_or("00:00:00:00")
            .to_string(),
        display_name: attr(&node, "displayName"),
        on_end: attr(&node, "onEnd"),
        alternative_sd_display_mode: attr(&node, "alternativeSDDisplayMode"),
        primary_clips,
        chapters,
        audio_tracks: nav_tracks(finder, node, "TrackNavigationList/AudioTrack"),
        subtitle_tracks: nav_tracks(finder, node, "TrackNavigationList/SubtitleTrack"),
        application_segments,
    }
}

fn clip_tracks(finder: &ElementFinder, clip: Node, name: &str) -> Vec<ClipTrack> {
    finder
        .find_all(clip, name)
        .into_iter()
        .map(|t| ClipTrack {
            track: attr(&t, "track"),
            stream_number: attr(&t, "streamNumber"),
            media_attr: attr(&t, "mediaAttr"),
            description: attr(&t, "description"),
        })
        .collect()
}

fn nav_tracks(finder: &ElementFinder, title: Node, path: &str) -> Vec<NavTrack> {
    finder
        .find_all(title, path)
        .into_iter()
        .map(|t| {
            let (langcode, language) = language::resolve(&attr(&t, "langcode"));
            NavTrack {
                track: attr(&t, "track"),
                langcode,
                language,
                description: attr(&t, "description"),
                selectable: t.attribute("selectable").unwrap_or("true").to_string(),
            }
        })
        .collect()
}

/// A title together with the video objects it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleCandidate {
    pub title: Title,
    pub evo_files: Vec<ClipRef>,
}

impl Candidate for TitleCandidate {
    fn label(&self) -> String {
        self.title.number.clone()
    }

    fn duration(&self) -> f64 {
        self.title.duration_secs()
    }

    fn total_size(&self) -> u64 {
        self.evo_files.iter().map(|c| c.size).sum()
    }

    fn description(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.title.id.is_empty() {
            parts.push(format!("ID: {}", self.title.id));
        }
        if !self.title.description.is_empty() {
            parts.push(format!("Description: {}", self.title.description));
        }
        Some(parts.join(", ")).filter(|s| !s.is_empty())
    }
}

/// Pairs titles with the `.EVO` files in `disc_dir`.
///
/// Missing files are ignored; a title whose files add up to zero bytes is
/// dropped.
pub fn candidates(disc_dir: &Path, titles: Vec<Title>) -> Vec<TitleCandidate> {
    titles
        .into_iter()
        .filter_map(|title| {
            let evo_files: Vec<ClipRef> = title
                .primary_clips
                .iter()
                .filter_map(|clip| {
                    let file = disc_dir.join(clip.evo_file_name());
                    match fs::metadata(&file) {
                        Ok(meta) => Some(ClipRef {
                            file,
                            size: meta.len(),
                        }),
                        Err(_) => {
                            debug!(file = %file.display(), "Clip without video object");
                            None
                        }
                    }
                })
                .collect();

            let candidate = TitleCandidate { title, evo_files };
            if candidate.total_size() > 0 {
                Some(candidate)
            } else {
                warn!(title = %candidate.title.number, "Title has no accessible EVO files");
                None
            }
        })
        .collect()
}

/// The first `ADV_OBJ/*.xpl` (by name) in `disc_dir` or its parent.
pub fn find_playlist(disc_dir: &Path) -> Option<PathBuf> {
    let mut roots = vec![disc_dir.to_path_buf()];
    if let Some(parent) = disc_dir.parent() {
        roots.push(parent.to_path_buf());
    }

    roots.iter().find_map(|root| {
        let mut xpls: Vec<PathBuf> = fs::read_dir(root.join("ADV_OBJ"))
            .ok()?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("xpl"))
            })
            .collect();
        xpls.sort();
        xpls.into_iter().next()
    })
}

/// The largest `.EVO` file in `disc_dir`; the first in name order wins ties.
pub fn largest_evo(disc_dir: &Path) -> Result<Option<ClipRef>> {
    let mut files: Vec<ClipRef> = Vec::new();
    for entry in fs::read_dir(disc_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_evo = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("evo"));
        if is_evo {
            files.push(ClipRef {
                size: entry.metadata()?.len(),
                file: path,
            });
        }
    }
    files.sort_by(|a, b| a.file.cmp(&b.file));

    let mut largest: Option<ClipRef> = None;
    for file in files {
        if largest.as_ref().map_or(true, |l| file.size > l.size) {
            largest = Some(file);
        }
    }
    Ok(largest)
}
