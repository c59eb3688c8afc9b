//! DVD title sets.
//!
//! `VTS_03_1.VOB`, `VTS_03_2.VOB` and `VTS_03_0.IFO` form title set `03`.
//! The IFO carries the program duration, the VOBs carry the streams.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::Result;

const GIB: f64 = (1u64 << 30) as f64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSet {
    /// Two digit set number, e.g. `03`.
    pub number: String,
    /// VOB files in name order.
    pub vobs: Vec<PathBuf>,
    pub ifo: PathBuf,
}

impl TitleSet {
    /// The first VOB of the set, `VTS_nn_1.VOB`.
    pub fn first_vob(&self) -> PathBuf {
        let dir = self.ifo.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("VTS_{}_1.VOB", self.number))
    }
}

/// Group the `VTS_*.VOB` files of `dir` by title set, in set order.
pub fn group_title_sets(dir: &Path) -> Result<Vec<TitleSet>> {
    let mut vobs: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("VTS_") && name.to_uppercase().ends_with(".VOB") {
            vobs.push((name, entry.path()));
        }
    }
    vobs.sort();

    let mut sets: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for (name, path) in vobs {
        let Some(number) = name.get(4..6) else {
            continue;
        };
        sets.entry(number.to_string()).or_default().push(path);
    }

    Ok(sets
        .into_iter()
        .map(|(number, vobs)| TitleSet {
            ifo: dir.join(format!("VTS_{}_0.IFO", number)),
            number,
            vobs,
        })
        .collect())
}

/// Duration in seconds of a title set, from the IFO's MediaInfo JSON.
///
/// Reads `media.track[1].Duration`, which MediaInfo writes as a string.
/// `None` if the track is missing or the value is not a plain number.
pub fn ifo_duration(json: &Value) -> Option<f64> {
    let duration = json.pointer("/media/track/1/Duration")?;
    match duration {
        Value::String(s) => {
            let valid = !s.is_empty()
                && s.replacen('.', "", 1).chars().all(|c| c.is_ascii_digit());
            if valid {
                s.parse().ok()
            } else {
                None
            }
        }
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Physical DVD format implied by the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    #[serde(rename = "DVD5")]
    Dvd5,
    #[serde(rename = "DVD9")]
    Dvd9,
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeClass::Dvd5 => write!(f, "DVD5"),
            SizeClass::Dvd9 => write!(f, "DVD9"),
        }
    }
}

/// `DVD5` up to 4.37 GiB, `DVD9` up to 7.95 GiB, nothing above.
pub fn size_class(gib: f64) -> Option<SizeClass> {
    if gib <= 4.37 {
        Some(SizeClass::Dvd5)
    } else if gib <= 7.95 {
        Some(SizeClass::Dvd9)
    } else {
        None
    }
}

/// Total size in bytes of the regular files directly in `dir`.
pub fn directory_size(dir: &Path) -> Result<u64> {
    let mut bytes = 0u64;
    for entry in fs::read_dir(dir)? {
        let meta = entry?.metadata()?;
        if meta.is_file() {
            bytes += meta.len();
        }
    }
    debug!(bytes, dir = %dir.display(), "DVD size");
    Ok(bytes)
}

/// Bytes as GiB, rounded to two decimals.
pub fn gib_rounded(bytes: u64) -> f64 {
    (bytes as f64 / GIB * 100.0).round() / 100.0
}
