//! Annotating a MediaInfo JSON report with what the text merge knows.
//!
//! The JSON of a multi-file title is taken from its first file; the totals,
//! the source file list, playlist languages and chapters are written into it
//! here.

use serde_json::{json, Map, Value};

use crate::types::ChapterMark;

#[derive(Debug, Clone, Default)]
pub struct JsonAnnotations {
    /// Total size in bytes.
    pub file_size: u64,
    pub duration_millis: Option<u64>,
    pub source_files: Vec<String>,
    pub audio_languages: Vec<(u32, String)>,
    pub subtitle_languages: Vec<(u32, String)>,
    pub chapters: Vec<ChapterMark>,
    /// `Format` of the added menu track.
    pub menu_format: String,
}

fn track_type(track: &Value) -> Option<&str> {
    track.get("@type").and_then(Value::as_str)
}

fn stream_order(track: &Value) -> Option<u32> {
    match track.get("StreamOrder")? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        _ => None,
    }
}

fn set(track: &mut Value, key: &str, value: Value) {
    if let Some(map) = track.as_object_mut() {
        map.insert(key.to_string(), value);
    }
}

/// Write `annotations` into `report`. Reports without `media.track` are left
/// untouched.
pub fn augment(report: &mut Value, annotations: &JsonAnnotations) {
    let Some(tracks) = report
        .pointer_mut("/media/track")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    if let Some(general) = tracks
        .iter_mut()
        .find(|t| track_type(t) == Some("General"))
    {
        set(general, "FileSize", json!(annotations.file_size.to_string()));
        if let Some(ms) = annotations.duration_millis {
            set(general, "Duration", json!(ms.to_string()));
        }
        set(
            general,
            "SourceFiles",
            json!(annotations.source_files.join(", ")),
        );
    }

    for (number, language) in &annotations.audio_languages {
        let target = tracks.iter_mut().find(|t| {
            track_type(t) == Some("Audio")
                && match stream_order(t) {
                    Some(order) => order + 1 == *number,
                    None => *number == 1,
                }
        });
        if let Some(track) = target {
            set(track, "Language", json!(language));
        }
    }

    for (number, language) in &annotations.subtitle_languages {
        let target = tracks.iter_mut().find(|t| {
            track_type(t) == Some("Text") && stream_order(t).unwrap_or(0) + 1 == *number
        });
        if let Some(track) = target {
            set(track, "Language", json!(language));
        }
    }

    if !annotations.chapters.is_empty() {
        let chapters: Vec<Value> = annotations
            .chapters
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let name = c
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Chapter {}", idx + 1));
                json!({ "time": c.millis, "name": name })
            })
            .collect();

        let mut menu = Map::new();
        menu.insert("@type".into(), json!("Menu"));
        menu.insert("Format".into(), json!(annotations.menu_format));
        menu.insert("Chapters".into(), Value::Array(chapters));
        tracks.push(Value::Object(menu));
    }
}
