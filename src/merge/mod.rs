//! Merging partial MediaInfo reports into one canonical report.
//!
//! Two shapes occur:
//!
//! * DVD: the first VOB and the IFO of the main title set. The IFO owns the
//!   `General` section, the VOB owns the stream sections.
//! * Multi-file titles (HD DVD): one report per `.EVO`. The first file owns
//!   everything; later files only contribute audio and subtitle tracks the
//!   first one lacks.
//!
//! Whatever the shape, the result is ordered `General`, `Video`, `Audio #n`,
//! `Text #n`, `Menu`, then anything else in the order it was met.

pub mod json;

use tracing::debug;

use crate::mediainfo::{format_line, key_of, render, split_sections, ReportSection};
use crate::types::ChapterMark;

/// Values computed outside the reports that replace theirs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralOverrides {
    /// e.g. `4.20 GiB`
    pub file_size: Option<String>,
    /// e.g. `1 h 45 min`
    pub duration: Option<String>,
}

/// Which report owns the `General` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// `[vob, ifo]`: the IFO.
    Ifo,
    /// The first of several files of one title.
    FirstFile,
}

/// Merge `reports` according to `authority` and order the result.
pub fn merge(reports: &[&str], authority: Authority, overrides: &GeneralOverrides) -> CanonicalReport {
    match authority {
        Authority::Ifo => {
            let vob = reports.first().copied().unwrap_or_default();
            let ifo = reports.get(1).copied().unwrap_or_default();
            merge_dvd(vob, ifo, overrides)
        }
        Authority::FirstFile => merge_multi_file(reports, overrides),
    }
}

fn find<'a>(sections: &'a [ReportSection], name: &str) -> Option<&'a ReportSection> {
    sections.iter().find(|s| s.name == name)
}

fn keys(section: &ReportSection) -> Vec<String> {
    section.lines.iter().map(|l| key_of(l).to_string()).collect()
}

/// Append the lines of `from` whose key `into` does not have yet.
fn append_missing_keys(into: &mut ReportSection, from: &ReportSection, skip: &[&str]) {
    let present = keys(into);
    for line in &from.lines {
        if !line.contains(':') {
            continue;
        }
        let key = key_of(line);
        if !present.iter().any(|k| k == key) && !skip.contains(&key) {
            into.lines.push(line.clone());
        }
    }
}

/// Merge the reports of a DVD title set's first VOB and its IFO.
pub fn merge_dvd(vob: &str, ifo: &str, overrides: &GeneralOverrides) -> CanonicalReport {
    let vob_sections = split_sections(vob);
    let ifo_sections = split_sections(ifo);
    let vob_general = find(&vob_sections, "General");

    let mut merged: Vec<ReportSection> = Vec::new();
    if let Some(ifo_general) = find(&ifo_sections, "General") {
        let mut general = ifo_general.clone();
        apply_in_place(&mut general, overrides);

        if let Some(vob_general) = vob_general {
            if let Some(rate) = vob_general.line("Overall bit rate") {
                let rate = rate.to_string();
                general.remove("Overall bit rate");
                general.lines.push(rate);
            }
            append_missing_keys(&mut general, vob_general, &["File size"]);
        }
        merged.push(general);
    } else if let Some(vob_general) = vob_general {
        let mut general = vob_general.clone();
        apply_in_place(&mut general, overrides);
        merged.push(general);
    }

    merged.extend(vob_sections.iter().filter(|s| s.name != "General").cloned());

    for section in ifo_sections.iter().filter(|s| s.name != "General") {
        match merged.iter_mut().find(|s| s.name == section.name) {
            Some(existing) => append_missing_keys(existing, section, &[]),
            None => merged.push(section.clone()),
        }
    }

    let mut report = CanonicalReport { sections: merged };
    report.order();
    report
}

fn apply_in_place(general: &mut ReportSection, overrides: &GeneralOverrides) {
    if let Some(size) = &overrides.file_size {
        general.set_line("File size", size);
    }
    if let Some(duration) = &overrides.duration {
        general.set_line("Duration", duration);
    }
}

fn apply_replacing(general: &mut ReportSection, overrides: &GeneralOverrides) {
    if let Some(size) = &overrides.file_size {
        general.remove("File size");
        general.lines.push(format_line("File size", size));
    }
    if let Some(duration) = &overrides.duration {
        general.remove("Duration");
        general.lines.push(format_line("Duration", duration));
    }
}

fn is_track_section(section: &ReportSection) -> bool {
    matches!(section.base_name(), "Audio" | "Text")
}

/// Merge the reports of the files making up one title, first file first.
pub fn merge_multi_file(reports: &[&str], overrides: &GeneralOverrides) -> CanonicalReport {
    let Some((first, rest)) = reports.split_first() else {
        return CanonicalReport::default();
    };

    let mut sections = split_sections(first);
    if let Some(general) = sections.iter_mut().find(|s| s.name == "General") {
        apply_replacing(general, overrides);
    }

    for report in rest {
        for section in split_sections(report) {
            if matches!(section.base_name(), "General" | "Video") {
                continue;
            }

            if !is_track_section(&section) {
                if find(&sections, &section.name).is_none() {
                    sections.push(section);
                }
                continue;
            }

            let Some(id) = section.line("ID").map(str::to_string) else {
                if find(&sections, &section.name).is_none() {
                    sections.push(section);
                }
                continue;
            };
            let known = sections
                .iter()
                .filter(|s| s.base_name() == section.base_name())
                .any(|s| s.lines.iter().any(|l| *l == id));
            if known {
                continue;
            }

            let base = section.base_name().to_string();
            let name = if sections.iter().any(|s| s.base_name() == base) {
                next_track_name(&mut sections, &base)
            } else {
                section.name.clone()
            };
            debug!(section = %name, %id, "Adding track from additional file");
            sections.push(ReportSection {
                name,
                lines: section.lines,
            });
        }
    }

    let mut report = CanonicalReport { sections };
    report.order();
    report
}

/// Next free `<base> #n`; a lone un-numbered `<base>` becomes `<base> #1`
/// first.
fn next_track_name(sections: &mut [ReportSection], base: &str) -> String {
    if let Some(plain) = sections.iter_mut().find(|s| s.name == base) {
        plain.name = format!("{} #1", base);
    }
    let max = sections
        .iter()
        .filter(|s| s.base_name() == base)
        .filter_map(ReportSection::number)
        .max()
        .unwrap_or(0);
    format!("{} #{}", base, max + 1)
}

/// Sort rank of a section: group, then number within the group.
fn rank(section: &ReportSection) -> (u8, u32) {
    let number = section.number().unwrap_or(0);
    match section.base_name() {
        "General" => (0, 0),
        "Video" => (1, number),
        "Audio" => (2, number),
        "Text" => (3, number),
        "Menu" => (4, number),
        _ => (5, 0),
    }
}

/// Formats milliseconds as `HH:MM:SS.mmm`.
pub fn chapter_timestamp(millis: u64) -> String {
    let secs = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis % 1000
    )
}

/// A merged report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalReport {
    sections: Vec<ReportSection>,
}

impl CanonicalReport {
    /// A single report taken as is.
    pub fn from_text(text: &str) -> Self {
        Self {
            sections: split_sections(text),
        }
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&ReportSection> {
        find(&self.sections, name)
    }

    /// Add `Language` lines to the `base` sections (`Audio` or `Text`).
    ///
    /// Track `n` is `<base> #n`, or the un-numbered section for track 1.
    /// Sections that already have a `Language` line are left alone.
    pub fn inject_languages(&mut self, base: &str, languages: &[(u32, String)]) {
        let anchor = match base {
            "Audio" => Some("Compression mode"),
            "Text" => Some("Format"),
            _ => None,
        };

        for (track, language) in languages {
            if language.is_empty() {
                continue;
            }
            let numbered = format!("{} #{}", base, track);
            let Some(section) = self
                .sections
                .iter_mut()
                .find(|s| s.name == numbered || (*track == 1 && s.name == base))
            else {
                debug!(section = %numbered, "No section for playlist language");
                continue;
            };
            if section.has_key("Language") {
                continue;
            }

            let line = format_line("Language", language);
            let inserted = anchor.map_or(false, |a| section.insert_after(a, line.clone()));
            if !inserted {
                section.lines.push(line);
            }
        }
    }

    /// Add a `Menu` section listing `chapters`, unless one exists.
    pub fn inject_chapters(&mut self, format_name: &str, chapters: &[ChapterMark]) {
        if chapters.is_empty() || self.sections.iter().any(|s| s.base_name() == "Menu") {
            return;
        }

        let mut menu = ReportSection::new("Menu");
        menu.lines.push(format_line("Format", format_name));
        for (idx, chapter) in chapters.iter().enumerate() {
            let name = chapter
                .name
                .clone()
                .unwrap_or_else(|| format!("Chapter {}", idx + 1));
            menu.lines
                .push(format!("{:<42}: {}", chapter_timestamp(chapter.millis), name));
        }
        self.sections.push(menu);
        self.order();
    }

    /// Put the sections in canonical order. Stable, so sections of the same
    /// rank keep their relative order.
    pub fn order(&mut self) {
        self.sections.sort_by_key(rank);
    }

    pub fn render(&self) -> String {
        render(&self.sections)
    }
}
