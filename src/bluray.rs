//! Blu-ray playlist scanning.
//!
//! Every `PLAYLIST/*.mpls` is decoded and checked against the files in
//! `STREAM/`. A playlist that plays the same stream file twice is a looping
//! or menu playlist and is never a main feature candidate.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::mpls::Mpls;
use crate::select::DEFAULT_MIN_DURATION;
use crate::types::{ChapterMark, ClipRef, PlaylistCandidate};
use crate::{Error, Result};

/// Candidates of at least ten minutes from the disc structure at `disc_path`.
pub fn scan(disc_path: &Path) -> Result<Vec<PlaylistCandidate>> {
    scan_with(disc_path, DEFAULT_MIN_DURATION)
}

/// Like [`scan`], with a custom duration floor in seconds.
///
/// `disc_path` is the directory holding `PLAYLIST/` and `STREAM/`, usually
/// `BDMV`.
pub fn scan_with(disc_path: &Path, min_duration: f64) -> Result<Vec<PlaylistCandidate>> {
    let playlist_dir = disc_path.join("PLAYLIST");
    if !playlist_dir.is_dir() {
        return Err(Error::NoPlaylistDirectory {
            path: disc_path.to_path_buf(),
        });
    }
    let stream_dir = disc_path.join("STREAM");
    if !stream_dir.is_dir() {
        return Err(Error::structural("STREAM directory", disc_path));
    }

    let mut containers: Vec<PathBuf> = fs::read_dir(&playlist_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("mpls"))
        })
        .collect();
    containers.sort();

    let mut candidates = Vec::new();
    for path in containers {
        let mpls = match fs::read(&path)
            .map_err(|e| Error::decode(&path, e))
            .and_then(|bytes| Mpls::parse(&bytes).map_err(|e| Error::decode(&path, e)))
        {
            Ok(mpls) => mpls,
            Err(e) => {
                warn!(error = %e, "Skipping playlist");
                continue;
            }
        };

        match candidate(&path, &mpls, &stream_dir) {
            Some(c) if c.duration >= min_duration => {
                debug!(
                    playlist = %c.id,
                    duration = c.duration,
                    clips = c.clips.len(),
                    "Playlist is a candidate"
                );
                candidates.push(c);
            }
            Some(c) => debug!(playlist = %c.id, duration = c.duration, "Playlist too short"),
            None => debug!(playlist = %path.display(), "Playlist reuses a stream file"),
        }
    }

    Ok(candidates)
}

/// Resolves the stream file of a clip, `.m2ts` before `.M2TS`.
fn stream_file(stream_dir: &Path, clip_name: &str) -> Option<PathBuf> {
    let name = clip_name.trim();
    [format!("{}.m2ts", name), format!("{}.M2TS", name)]
        .into_iter()
        .map(|file| stream_dir.join(file))
        .find(|p| p.is_file())
}

/// Builds the candidate for one decoded playlist, `None` if any stream file
/// is referenced more than once.
fn candidate(path: &Path, mpls: &Mpls, stream_dir: &Path) -> Option<PlaylistCandidate> {
    // (file, size, references) in first-seen order
    let mut refs: Vec<(PathBuf, u64, usize)> = Vec::new();
    for item in &mpls.play_list.play_items {
        let Some(file) = stream_file(stream_dir, &item.clip.file_name) else {
            continue;
        };
        match refs.iter_mut().find(|(f, _, _)| *f == file) {
            Some(entry) => entry.2 += 1,
            None => {
                let size = fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
                refs.push((file, size, 1));
            }
        }
    }

    if refs.iter().any(|(_, _, count)| *count != 1) {
        return None;
    }

    let id = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let chapters = mpls
        .chapters()
        .into_iter()
        .map(|millis| ChapterMark { millis, name: None })
        .collect();

    Some(PlaylistCandidate {
        id,
        duration: mpls.duration(),
        clips: refs
            .into_iter()
            .map(|(file, size, _)| ClipRef { file, size })
            .collect(),
        path: path.to_path_buf(),
        chapters,
    })
}
