use super::parser::parse_mpls;
use super::MplsError;
use std::{fmt::Debug, io::Read};

/// A decoded movie playlist.
///
/// Only the parts needed to judge a playlist are kept: the header offsets,
/// the play items of the main path and the playlist marks. Sub-paths and
/// extension data are skipped.
#[derive(Debug, Clone)]
pub struct Mpls {
    pub header: Header,
    pub play_list: PlayList,
    pub marks: Vec<PlayListMark>,
}

/// The fixed-size container header.
///
/// The three addresses are absolute byte offsets into the file. The playlist
/// body and the mark table are decoded at the offsets named here rather than
/// by walking the file sequentially.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: String,
    pub play_list_start: u32,
    pub play_list_mark_start: u32,
    pub ext_data_start: u32,
}

impl Mpls {
    /// Decodes a movie playlist from an in-memory buffer.
    pub fn parse(bytes: &[u8]) -> Result<Mpls, MplsError> {
        parse_mpls(bytes)
    }

    /// Reads the whole reader into memory and decodes it.
    ///
    /// ```no_run
    /// # fn main() -> Result<(), discparse::mpls::MplsError> {
    /// use std::fs::File;
    /// use discparse::mpls::Mpls;
    ///
    /// let file = File::open("BDMV/PLAYLIST/00800.mpls")?;
    /// let mpls = Mpls::from(file)?;
    /// println!("{:.0} seconds", mpls.duration());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from<R: Read>(mut reader: R) -> Result<Mpls, MplsError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Mpls::parse(&buffer)
    }

    /// Total playing time of the main path, in seconds.
    pub fn duration(&self) -> f64 {
        self.play_list
            .play_items
            .iter()
            .map(PlayItem::duration)
            .sum()
    }

    /// Entry-point marks as offsets from the start of the playlist, in
    /// milliseconds.
    ///
    /// Mark time stamps are expressed on the referenced play item's clip
    /// timeline, so each one is rebased onto the running playlist time.
    pub fn chapters(&self) -> Vec<u64> {
        let items = &self.play_list.play_items;
        let mut starts = Vec::with_capacity(items.len());
        let mut elapsed = 0u64;
        for item in items {
            starts.push(elapsed);
            elapsed += item.out_time.ticks_between(item.in_time);
        }

        self.marks
            .iter()
            .filter(|m| m.mark_type == MarkType::EntryPoint)
            .filter_map(|m| {
                let idx = m.play_item as usize;
                let item = items.get(idx)?;
                let within = m.time_stamp.ticks_between(item.in_time);
                Some((starts[idx] + within) / 45)
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PlayList {
    pub play_items: Vec<PlayItem>,
}

#[derive(Debug, Clone)]
pub struct PlayItem {
    pub clip: Clip,
    /// Clips of the additional angles, if the item is multi-angle.
    pub angles: Vec<Clip>,
    pub in_time: TimeStamp,
    pub out_time: TimeStamp,
    pub streams: StreamTable,
}

impl PlayItem {
    /// Length of the in/out interval in seconds.
    pub fn duration(&self) -> f64 {
        self.out_time.ticks_between(self.in_time) as f64 / 45_000f64
    }
}

/// A clip file, also known as a segment.
///
/// `file_name` consists of 5 digits (e.g. "00055") and `codec_id` of 4
/// letters, usually "M2TS".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub file_name: String,
    pub codec_id: String,
}

impl Clip {
    /// The stream file this clip plays from, e.g. `00055.m2ts`.
    pub fn stream_file_name(&self) -> String {
        format!("{}.m2ts", self.file_name.trim())
    }
}

/// Primary streams of a play item.
#[derive(Debug, Clone, Default)]
pub struct StreamTable {
    pub video: Vec<StreamInfo>,
    pub audio: Vec<StreamInfo>,
    pub subtitles: Vec<StreamInfo>,
    pub interactive_graphics: Vec<StreamInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub coding_type: u8,
    pub kind: StreamKind,
    pub language: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Graphics,
    Text,
    Unknown,
}

impl StreamKind {
    pub(crate) fn from_coding_type(coding_type: u8) -> StreamKind {
        match coding_type {
            0x01 | 0x02 | 0x1B | 0x20 | 0x24 | 0xEA => StreamKind::Video,
            0x03 | 0x04 | 0x80..=0x86 | 0xA1 | 0xA2 => StreamKind::Audio,
            0x90 | 0x91 => StreamKind::Graphics,
            0x92 => StreamKind::Text,
            _ => StreamKind::Unknown,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct PlayListMark {
    pub mark_type: MarkType,
    /// Index of the play item the time stamp refers to.
    pub play_item: u16,
    pub time_stamp: TimeStamp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkType {
    EntryPoint,
    LinkPoint,
    Unknown,
}

/// A time stamp, relative to some System Time Clock sequence, expressed in 45 KHz.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct TimeStamp(pub u32);

impl TimeStamp {
    /// Returns this time stamp in units of seconds.
    pub fn seconds(&self) -> f64 {
        (self.0 as f64) / 45_000f64
    }

    /// Ticks from `earlier` to `self`, zero if `earlier` is later.
    pub fn ticks_between(&self, earlier: TimeStamp) -> u64 {
        self.0.saturating_sub(earlier.0) as u64
    }
}

impl Debug for TimeStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeStamp")
            .field("raw", &self.0)
            .field("secs", &self.seconds())
            .finish()
    }
}
