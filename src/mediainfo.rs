//! MediaInfo reports: running the tool and working with its text output.
//!
//! The text report is a list of sections. A section starts with a line that
//! has no colon (`General`, `Video`, `Audio #2`, `Menu`) and holds
//! `Key    : value` lines until the next section.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use crate::config::MediaInfoSettings;
use crate::{Error, Result};

/// Width of the key column in MediaInfo's text output.
pub const KEY_WIDTH: usize = 41;

/// Formats a `Key : value` line the way MediaInfo aligns it.
pub fn format_line(key: &str, value: &str) -> String {
    format!("{:<width$}: {}", key, value, width = KEY_WIDTH)
}

/// Key part of a report line.
pub fn key_of(line: &str) -> &str {
    line.split(':').next().unwrap_or_default().trim()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub name: String,
    pub lines: Vec<String>,
}

impl ReportSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    /// `Audio` for `Audio #2`.
    pub fn base_name(&self) -> &str {
        self.name.split(" #").next().unwrap_or_default().trim()
    }

    /// `2` for `Audio #2`, `None` for `Audio`.
    pub fn number(&self) -> Option<u32> {
        self.name
            .split_once(" #")
            .and_then(|(_, n)| n.trim().parse().ok())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lines.iter().any(|l| key_of(l) == key)
    }

    /// The full line for `key`, if present.
    pub fn line(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| key_of(l) == key)
            .map(String::as_str)
    }

    /// Replace the first `key` line in place, or append one.
    pub fn set_line(&mut self, key: &str, value: &str) {
        let line = format_line(key, value);
        match self.lines.iter_mut().find(|l| key_of(l) == key) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
    }

    /// Drop every `key` line.
    pub fn remove(&mut self, key: &str) {
        self.lines.retain(|l| key_of(l) != key);
    }

    /// Insert `line` after the first `anchor` line. Returns `false`, leaving
    /// the section untouched, if there is no such line.
    pub fn insert_after(&mut self, anchor: &str, line: String) -> bool {
        match self.lines.iter().position(|l| key_of(l) == anchor) {
            Some(pos) => {
                self.lines.insert(pos + 1, line);
                true
            }
            None => false,
        }
    }
}

/// Split a text report into sections.
///
/// Blank lines are dropped, content lines are trimmed, and lines before the
/// first section header are ignored.
pub fn split_sections(text: &str) -> Vec<ReportSection> {
    let mut sections: Vec<ReportSection> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let indented = raw.starts_with(char::is_whitespace);
        if !line.contains(':') && !indented {
            sections.push(ReportSection::new(line));
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line.to_string());
        }
    }
    sections
}

/// Render sections back to text, each followed by an empty line.
pub fn render(sections: &[ReportSection]) -> String {
    let mut out: Vec<&str> = Vec::new();
    for section in sections {
        out.push(&section.name);
        out.extend(section.lines.iter().map(String::as_str));
        out.push("");
    }
    out.join("\n")
}

/// Something that describes media files the way MediaInfo does.
pub trait MediaInspector {
    /// The plain text report.
    fn text(&self, path: &Path) -> Result<String>;

    /// The `--Output=JSON` report.
    fn json(&self, path: &Path) -> Result<Value>;
}

/// The `mediainfo` command line tool.
#[derive(Debug, Clone)]
pub struct MediaInfoCli {
    pub binary: PathBuf,
}

impl Default for MediaInfoCli {
    fn default() -> Self {
        Self::from_settings(&MediaInfoSettings::default())
    }
}

impl MediaInfoCli {
    pub fn from_settings(settings: &MediaInfoSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
        }
    }

    fn run(&self, args: &[&str], path: &Path) -> Result<String> {
        debug!(binary = %self.binary.display(), ?args, path = %path.display(), "Running mediainfo");
        let output = Command::new(&self.binary)
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::external_tool("mediainfo", "tool not found")
                } else {
                    Error::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::external_tool("mediainfo", stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n"))
    }
}

impl MediaInspector for MediaInfoCli {
    fn text(&self, path: &Path) -> Result<String> {
        self.run(&[], path)
    }

    fn json(&self, path: &Path) -> Result<Value> {
        let stdout = self.run(&["--Output=JSON"], path)?;
        Ok(serde_json::from_str(&stdout)?)
    }
}
