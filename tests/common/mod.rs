#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use discparse::bdinfo::ReportGenerator;
use discparse::mediainfo::MediaInspector;
use discparse::select::{CandidateSummary, SelectionPolicy, SelectionProvider};
use discparse::{Error, Result};
use serde_json::Value;

const TICKS: u32 = 45_000;
const IN_TIME: u32 = 27_000_000;

/// Builds MPLS bytes: header, one playlist section, one mark section.
#[derive(Default)]
pub struct MplsBuilder {
    items: Vec<(String, u32)>,
    marks: Vec<(u16, u32)>,
}

impl MplsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A play item of `seconds` referencing stream file `clip`.
    pub fn item(mut self, clip: &str, seconds: u32) -> Self {
        self.items.push((clip.to_string(), seconds));
        self
    }

    /// An entry mark `seconds` into play item `item`.
    pub fn mark(mut self, item: u16, seconds: u32) -> Self {
        self.marks.push((item, seconds));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut play_list = Vec::new();
        play_list.extend_from_slice(&[0, 0]);
        play_list.extend_from_slice(&(self.items.len() as u16).to_be_bytes());
        play_list.extend_from_slice(&0u16.to_be_bytes());
        for (clip, seconds) in &self.items {
            let mut body = Vec::new();
            body.extend_from_slice(format!("{:0>5}", clip).as_bytes());
            body.extend_from_slice(b"M2TS");
            body.extend_from_slice(&[0x00, 0x01, 0x00]);
            body.extend_from_slice(&IN_TIME.to_be_bytes());
            body.extend_from_slice(&(IN_TIME + seconds * TICKS).to_be_bytes());
            body.extend_from_slice(&[0; 12]);
            body.extend_from_slice(&14u16.to_be_bytes());
            body.extend_from_slice(&[0; 14]);

            play_list.extend_from_slice(&(body.len() as u16).to_be_bytes());
            play_list.extend(body);
        }

        let mut marks = Vec::new();
        marks.extend_from_slice(&(self.marks.len() as u16).to_be_bytes());
        for (item, seconds) in &self.marks {
            marks.extend_from_slice(&[0x00, 0x01]);
            marks.extend_from_slice(&item.to_be_bytes());
            marks.extend_from_slice(&(IN_TIME + seconds * TICKS).to_be_bytes());
            marks.extend_from_slice(&[0xFF, 0xFF, 0, 0, 0, 0]);
        }

        let play_list_start = 40u32;
        let mark_start = play_list_start + 4 + play_list.len() as u32;

        let mut data = b"MPLS0300".to_vec();
        data.extend_from_slice(&play_list_start.to_be_bytes());
        data.extend_from_slice(&mark_start.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&[0; 20]);
        data.extend_from_slice(&(play_list.len() as u32).to_be_bytes());
        data.extend(play_list);
        data.extend_from_slice(&(marks.len() as u32).to_be_bytes());
        data.extend(marks);
        data
    }
}

/// A full BDInfo report for playlist 00001.
pub const BDINFO_REPORT: &str = "DISC INFO:

Disc Title:     Example Movie
[code]
Disc Title:     Example Movie
Disc Size:      25,000,000,000 bytes
[/code]

PLAYLIST REPORT:
[code]
Name:                   00001.MPLS
Length:                 1:30:00.000 (h:m:s.ms)
Total Bitrate:          30.33 Mbps

FILES:

Name            Time In         Length          Size            Total Bitrate
--------------- -------------   -------------   -------------   -------------
00001.M2TS      0:00:00.000     1:00:00.000     24,000,000,000  44,387
00002.M2TS      1:00:00.000     0:30:00.000     1,000,000,000   4,444

CHAPTERS:

Number          Time In         Length
1               0:00:00.000     0:05:00.000
[/code]

QUICK SUMMARY:

Disc Title: Example Movie
Disc Label: EXAMPLE_MOVIE
Disc Size: 25,000,000,000 bytes
Protection: AACS
Playlist: 00001.MPLS
Size: 25,000,000,000 bytes
Length: 1:30:00.000
Total Bitrate: 30.33 Mbps
Video: MPEG-4 AVC Video / 25000 kbps / 1080p / 23.976 fps / 16:9 / High Profile 4.1
Audio: English / Dolby TrueHD/Atmos Audio / 7.1 / 48 kHz / 4658 kbps / 24-bit
Subtitle: English / 31.123 kbps
********************
";

/// Writes [`BDINFO_REPORT`] into the output directory for every playlist
/// unless it is silent.
#[derive(Default)]
pub struct FakeGenerator {
    pub silent: bool,
    pub calls: RefCell<Vec<String>>,
}

impl FakeGenerator {
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ReportGenerator for FakeGenerator {
    fn generate(&self, _disc_path: &Path, playlist: &str, out_dir: &Path) -> Result<()> {
        self.calls.borrow_mut().push(playlist.to_string());
        if self.silent {
            return Err(Error::external_tool("BDInfo", "no output"));
        }
        fs::write(out_dir.join(format!("BDINFO.{}.txt", playlist)), BDINFO_REPORT)?;
        Ok(())
    }
}

/// Canned MediaInfo output keyed by file name.
#[derive(Default)]
pub struct FakeInspector {
    pub texts: HashMap<String, String>,
    pub json: HashMap<String, Value>,
}

impl FakeInspector {
    pub fn with_text(mut self, file: &str, text: &str) -> Self {
        self.texts.insert(file.to_string(), text.to_string());
        self
    }

    pub fn with_json(mut self, file: &str, json: Value) -> Self {
        self.json.insert(file.to_string(), json);
        self
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl MediaInspector for FakeInspector {
    fn text(&self, path: &Path) -> Result<String> {
        self.texts
            .get(&file_name(path))
            .cloned()
            .ok_or_else(|| Error::external_tool("mediainfo", format!("no report for {}", path.display())))
    }

    fn json(&self, path: &Path) -> Result<Value> {
        self.json
            .get(&file_name(path))
            .cloned()
            .ok_or_else(|| Error::external_tool("mediainfo", format!("no report for {}", path.display())))
    }
}

/// Answers every prompt the same way.
pub struct FakeProvider {
    pub answer: SelectionPolicy,
    pub edition: Option<String>,
    pub asked: Cell<usize>,
}

impl FakeProvider {
    pub fn new(answer: SelectionPolicy) -> Self {
        Self {
            answer,
            edition: None,
            asked: Cell::new(0),
        }
    }
}

impl SelectionProvider for FakeProvider {
    fn choose(&self, _candidates: &[CandidateSummary]) -> Result<SelectionPolicy> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.answer.clone())
    }

    fn edition_label(&self, _candidate: &CandidateSummary, _current: &str) -> Option<String> {
        self.edition.clone()
    }
}

/// Lays out `<root>/BDMV/{PLAYLIST,STREAM}` with the given playlists and
/// stream files of the given sizes.
pub fn bluray_disc(root: &Path, playlists: &[(&str, Vec<u8>)], streams: &[(&str, usize)]) {
    let playlist_dir = root.join("BDMV").join("PLAYLIST");
    let stream_dir = root.join("BDMV").join("STREAM");
    fs::create_dir_all(&playlist_dir).unwrap();
    fs::create_dir_all(&stream_dir).unwrap();

    for (name, bytes) in playlists {
        fs::write(playlist_dir.join(name), bytes).unwrap();
    }
    for (name, size) in streams {
        fs::write(stream_dir.join(name), vec![0u8; *size]).unwrap();
    }
}
