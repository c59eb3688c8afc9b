//! Exported MediaInfo artifacts.
//!
//! Text reports lose their tool banner and absolute paths. JSON reports are
//! reduced to a fixed set of fields per track type.

use std::path::Path;

use serde_json::{Map, Value};

const GENERAL_FIELDS: &[&str] = &[
    "UniqueID",
    "VideoCount",
    "AudioCount",
    "TextCount",
    "MenuCount",
    "FileExtension",
    "Format",
    "Format_Version",
    "FileSize",
    "Duration",
    "OverallBitRate",
    "FrameRate",
    "FrameCount",
    "StreamSize",
    "IsStreamable",
    "File_Created_Date",
    "File_Created_Date_Local",
    "File_Modified_Date",
    "File_Modified_Date_Local",
    "Encoded_Application",
    "Encoded_Library",
    "SourceFiles",
];

const VIDEO_FIELDS: &[&str] = &[
    "StreamOrder",
    "ID",
    "UniqueID",
    "Format",
    "Format_Profile",
    "Format_Version",
    "Format_Level",
    "Format_Tier",
    "HDR_Format",
    "HDR_Format_Version",
    "HDR_Format_String",
    "HDR_Format_Profile",
    "HDR_Format_Level",
    "HDR_Format_Settings",
    "HDR_Format_Compression",
    "HDR_Format_Compatibility",
    "CodecID",
    "CodecID_Hint",
    "Duration",
    "BitRate",
    "Width",
    "Height",
    "Stored_Height",
    "Sampled_Width",
    "Sampled_Height",
    "PixelAspectRatio",
    "DisplayAspectRatio",
    "FrameRate_Mode",
    "FrameRate",
    "FrameRate_Num",
    "FrameRate_Den",
    "FrameCount",
    "Standard",
    "ColorSpace",
    "ChromaSubsampling",
    "ChromaSubsampling_Position",
    "BitDepth",
    "ScanType",
    "ScanOrder",
    "Delay",
    "Delay_Source",
    "StreamSize",
    "Language",
    "Default",
    "Forced",
    "colour_description_present",
    "colour_description_present_Source",
    "colour_range",
    "colour_range_Source",
    "colour_primaries",
    "colour_primaries_Source",
    "transfer_characteristics",
    "transfer_characteristics_Source",
    "transfer_characteristics_Original",
    "matrix_coefficients",
    "matrix_coefficients_Source",
    "MasteringDisplay_ColorPrimaries",
    "MasteringDisplay_ColorPrimaries_Source",
    "MasteringDisplay_Luminance",
    "MasteringDisplay_Luminance_Source",
    "MaxCLL",
    "MaxCLL_Source",
    "MaxFALL",
    "MaxFALL_Source",
    "Encoded_Library_Settings",
];

const AUDIO_FIELDS: &[&str] = &[
    "StreamOrder",
    "ID",
    "UniqueID",
    "Format",
    "Format_Version",
    "Format_Profile",
    "Format_Settings",
    "Format_Commercial_IfAny",
    "Format_Settings_Endianness",
    "Format_AdditionalFeatures",
    "CodecID",
    "Duration",
    "BitRate_Mode",
    "BitRate",
    "Channels",
    "ChannelPositions",
    "ChannelLayout",
    "Channels_Original",
    "ChannelLayout_Original",
    "SamplesPerFrame",
    "SamplingRate",
    "SamplingCount",
    "FrameRate",
    "FrameCount",
    "Compression_Mode",
    "Delay",
    "Delay_Source",
    "Video_Delay",
    "StreamSize",
    "Title",
    "Language",
    "ServiceKind",
    "Default",
    "Forced",
    "extra",
];

const TEXT_FIELDS: &[&str] = &[
    "@typeorder",
    "StreamOrder",
    "ID",
    "UniqueID",
    "Format",
    "CodecID",
    "Duration",
    "BitRate",
    "FrameRate",
    "FrameCount",
    "ElementCount",
    "StreamSize",
    "Title",
    "Language",
    "Default",
    "Forced",
];

const MENU_FIELDS: &[&str] = &["Format", "Chapters", "extra"];

fn whitelist(track_type: &str) -> Option<&'static [&'static str]> {
    match track_type {
        "General" => Some(GENERAL_FIELDS),
        "Video" => Some(VIDEO_FIELDS),
        "Audio" => Some(AUDIO_FIELDS),
        "Text" => Some(TEXT_FIELDS),
        "Menu" => Some(MENU_FIELDS),
        _ => None,
    }
}

/// Remove the tool banner lines and replace `media_path` by its file name.
pub fn clean_text_report(text: &str, media_path: &Path) -> String {
    let cleaned = text
        .lines()
        .filter(|line| {
            let line = line.trim();
            !line.starts_with("ReportBy") && !line.starts_with("Report created by ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let full = media_path.to_string_lossy();
    match media_path.file_name() {
        Some(name) if !full.is_empty() => cleaned.replace(full.as_ref(), &name.to_string_lossy()),
        _ => cleaned,
    }
}

/// Reduce a MediaInfo JSON report to the whitelisted fields of each track.
///
/// Tracks of other types are dropped. Fields a track does not have are
/// omitted rather than written empty.
pub fn filter_mediainfo_json(report: &Value) -> Value {
    let mut media = Map::new();
    if let Some(reference) = report.pointer("/media/@ref") {
        media.insert("@ref".into(), reference.clone());
    }

    let tracks: Vec<Value> = report
        .pointer("/media/track")
        .and_then(Value::as_array)
        .map(|tracks| tracks.iter().filter_map(filter_track).collect())
        .unwrap_or_default();
    media.insert("track".into(), Value::Array(tracks));

    let mut filtered = Map::new();
    filtered.insert(
        "creatingLibrary".into(),
        report.get("creatingLibrary").cloned().unwrap_or(Value::Null),
    );
    filtered.insert("media".into(), Value::Object(media));
    Value::Object(filtered)
}

fn filter_track(track: &Value) -> Option<Value> {
    let track_type = track.get("@type")?.as_str()?;
    let fields = whitelist(track_type)?;

    let mut out = Map::new();
    out.insert("@type".into(), Value::String(track_type.to_string()));
    for field in fields {
        if let Some(value) = track.get(*field) {
            out.insert((*field).to_string(), value.clone());
        }
    }
    Some(Value::Object(out))
}
