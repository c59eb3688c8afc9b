//! End-to-end processing of a batch of discs.
//!
//! Discs are handled one after the other. A failing disc is logged and
//! recorded in its [`DiscOutcome`]; the rest of the batch still runs.
//! Artifacts land in the run directory, `<work_dir>/tmp/<run id>/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::bdinfo::{self, ReportGenerator};
use crate::config::Config;
use crate::error::ErrorKind;
use crate::export::{clean_text_report, filter_mediainfo_json};
use crate::hddvd::{self, TitleCandidate};
use crate::mediainfo::MediaInspector;
use crate::merge::json::{augment, JsonAnnotations};
use crate::merge::{self, Authority, GeneralOverrides};
use crate::select::{self, MainFeatureSelector, SelectionPolicy, SelectionProvider};
use crate::types::{Disc, DiscKind, DiscReport, PlaylistCandidate};
use crate::{bluray, dvd, Error, Result};

const GIB: f64 = (1u64 << 30) as f64;

/// `Format` of the menu section built from HD DVD chapters.
pub const HD_DVD_MENU_FORMAT: &str = "HD DVD-Video";

/// The directory artifacts of one run are written to.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    id: String,
    root: PathBuf,
}

impl RunDirectory {
    /// Create `<work_dir>/tmp/<run_id>`, with a fresh id when none is given.
    pub fn create(work_dir: &Path, run_id: Option<&str>) -> Result<Self> {
        let id = match run_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let root = work_dir.join("tmp").join(&id);
        fs::create_dir_all(&root)?;
        debug!(dir = %root.display(), "Run directory ready");
        Ok(Self { id, root })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }
}

/// What happened to one disc of a batch.
#[derive(Debug)]
pub struct DiscOutcome {
    pub disc: Disc,
    pub result: Result<()>,
}

impl DiscOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Build the discs of a batch from their paths, in order.
pub fn discover<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Disc>> {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let path = path.as_ref();
            let kind = DiscKind::detect(path)
                .ok_or_else(|| Error::structural("disc structure", path))?;
            Ok(Disc::new(index, path, kind))
        })
        .collect()
}

/// Bytes of every file below `path`.
pub fn disc_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

fn at_disc(err: Error, path: &Path) -> Error {
    match err {
        Error::NoCandidates { .. } => Error::NoCandidates {
            path: path.to_path_buf(),
        },
        other => other,
    }
}

pub struct Pipeline<'a> {
    config: Config,
    policy: SelectionPolicy,
    run_dir: RunDirectory,
    inspector: &'a dyn MediaInspector,
    generator: &'a dyn ReportGenerator,
    provider: Option<&'a dyn SelectionProvider>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: Config,
        run_dir: RunDirectory,
        inspector: &'a dyn MediaInspector,
        generator: &'a dyn ReportGenerator,
    ) -> Self {
        let policy = config.selection_policy();
        Self {
            config,
            policy,
            run_dir,
            inspector,
            generator,
            provider: None,
        }
    }

    /// Operator prompts go to `provider`. Without one, interactive
    /// selections fail.
    pub fn with_provider(mut self, provider: &'a dyn SelectionProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn run_dir(&self) -> &RunDirectory {
        &self.run_dir
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    fn selector(&self) -> MainFeatureSelector<'a> {
        let selector = MainFeatureSelector::new(self.config.min_duration_secs);
        match self.provider {
            Some(provider) => selector.with_provider(provider),
            None => selector,
        }
    }

    pub fn process_batch(&self, discs: Vec<Disc>) -> Vec<DiscOutcome> {
        discs
            .into_iter()
            .map(|mut disc| {
                info!(disc = %disc.path.display(), kind = ?disc.kind, "Processing disc");
                let result = self.process_disc(&mut disc);
                if let Err(e) = &result {
                    error!(disc = %disc.path.display(), error = %e, "Skipping disc");
                }
                DiscOutcome { disc, result }
            })
            .collect()
    }

    pub fn process_disc(&self, disc: &mut Disc) -> Result<()> {
        match disc.kind {
            DiscKind::BluRay => self.process_bluray(disc)?,
            DiscKind::Dvd => self.process_dvd(disc)?,
            DiscKind::HdDvd => self.process_hddvd(disc)?,
        }

        let json = serde_json::to_string_pretty(disc)?;
        fs::write(self.run_dir.file(format!("DISC_{}.json", disc.number())), json)?;
        Ok(())
    }

    fn process_bluray(&self, disc: &mut Disc) -> Result<()> {
        let structure = disc.kind.structure_dir(&disc.path);
        disc.size = disc_size(&disc.path);

        let candidates = bluray::scan_with(&structure, self.config.min_duration_secs)?;
        let selected = self
            .selector()
            .select(candidates, &self.policy)
            .map_err(|e| at_disc(e, &disc.path))?;
        let summaries = select::summarize(&selected);

        for (idx, playlist) in selected.iter().enumerate() {
            let mut report = match self.bluray_report(disc, playlist, idx) {
                Ok(report) => report,
                Err(e) => {
                    error!(playlist = %playlist.id, error = %e, "Skipping playlist");
                    continue;
                }
            };

            if selected.len() > 1 {
                report.edition = self.edition(&summaries[idx], &report, idx);
            }
            disc.reports.push(report);
        }

        disc.playlists = selected;
        Ok(())
    }

    fn edition(&self, summary: &select::CandidateSummary, report: &DiscReport, idx: usize) -> Option<String> {
        let current = if report.label.is_empty() {
            format!("Playlist {}", idx)
        } else {
            report.label.clone()
        };
        if !self.config.prompts_allowed() {
            debug!(playlist = %summary.label, "Unattended, keeping label");
            return None;
        }
        self.provider?
            .edition_label(summary, &current)
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
    }

    /// Produce, parse and export the report of one selected playlist.
    fn bluray_report(&self, disc: &Disc, playlist: &PlaylistCandidate, idx: usize) -> Result<DiscReport> {
        let number = Path::new(&playlist.id)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| playlist.id.clone());
        let full = self
            .run_dir
            .file(format!("Disc{}_{}_FULL.txt", disc.index + 1, number));

        if full.is_file() {
            debug!(report = %full.display(), "Reusing report");
        } else {
            self.generate_report(&disc.path, &playlist.id, &full)?;
        }

        let text = String::from_utf8_lossy(&fs::read(&full)?).to_string();
        let report = bdinfo::parse_output(&text, &disc.path)?;

        let suffix = if idx == 0 {
            String::new()
        } else {
            format!("_{}", idx)
        };
        let nn = disc.number();
        fs::write(
            self.run_dir.file(format!("BD_SUMMARY_{}{}.txt", nn, suffix)),
            report.summary.trim(),
        )?;
        fs::write(
            self.run_dir.file(format!("BD_SUMMARY_EXT_{}{}.txt", nn, suffix)),
            report.extended_summary.trim(),
        )?;

        info!(playlist = %playlist.id, title = %report.title, "Parsed playlist report");
        Ok(report)
    }

    /// Run the generator and move its newest `BDINFO*.txt` to `target`,
    /// trying a second time after the configured delay.
    fn generate_report(&self, disc_path: &Path, playlist: &str, target: &Path) -> Result<()> {
        let out_dir = self.run_dir.path();
        for attempt in 1..=2 {
            if attempt > 1 {
                let delay = self.config.bdinfo.retry_delay_secs;
                warn!(playlist, delay, "No report found, retrying");
                thread::sleep(Duration::from_secs(delay));
            }

            if let Err(e) = self.generator.generate(disc_path, playlist, out_dir) {
                warn!(playlist, attempt, error = %e, "Report generator failed");
            }
            if let Some(found) = bdinfo::locate_newest_report(out_dir)? {
                fs::rename(&found, target)?;
                return Ok(());
            }
        }
        Err(Error::external_tool(
            "BDInfo",
            format!("no report for playlist {}", playlist),
        ))
    }

    fn process_dvd(&self, disc: &mut Disc) -> Result<()> {
        let dir = disc.kind.structure_dir(&disc.path);
        let sets = dvd::group_title_sets(&dir)?;

        let mut usable = Vec::new();
        let mut durations = Vec::new();
        for set in sets {
            let duration = match self.inspector.json(&set.ifo) {
                Ok(json) => dvd::ifo_duration(&json),
                Err(e) => {
                    warn!(set = %set.number, error = %e, "Cannot inspect IFO");
                    None
                }
            };
            match duration {
                Some(duration) => {
                    durations.push(duration);
                    usable.push(set);
                }
                None => warn!(set = %set.number, "Skipping title set without duration"),
            }
        }

        let main = select::pick_by_duration_hysteresis(&durations)
            .and_then(|idx| usable.get(idx))
            .ok_or_else(|| Error::NoCandidates {
                path: disc.path.clone(),
            })?;
        info!(set = %main.number, "Main title set");

        let vob = main.first_vob();
        let vob_text = clean_text_report(&self.inspector.text(&vob)?, &vob);
        let ifo_text = clean_text_report(&self.inspector.text(&main.ifo)?, &main.ifo);

        disc.size = dvd::directory_size(&dir)?;
        let gib = dvd::gib_rounded(disc.size);
        disc.size_gib = Some(gib);
        disc.size_class = dvd::size_class(gib);

        let overrides = GeneralOverrides {
            file_size: Some(format!("{} GiB", gib)),
            duration: None,
        };
        let text = merge::merge(&[vob_text.as_str(), ifo_text.as_str()], Authority::Ifo, &overrides).render();
        fs::write(
            self.run_dir
                .file(format!("DVD_MEDIAINFO_{}.txt", disc.number())),
            &text,
        )?;
        disc.mediainfo = Some(text);
        Ok(())
    }

    fn process_hddvd(&self, disc: &mut Disc) -> Result<()> {
        let dir = disc.kind.structure_dir(&disc.path);
        disc.size = disc_size(&disc.path);

        match self.hddvd_from_playlist(disc, &dir) {
            Ok(()) => Ok(()),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::Structural | ErrorKind::Xml | ErrorKind::NoCandidates
                ) =>
            {
                warn!(error = %e, "Playlist processing failed, using the largest EVO");
                self.hddvd_largest_evo(disc, &dir)
            }
            Err(e) => Err(e),
        }
    }

    fn hddvd_from_playlist(&self, disc: &mut Disc, dir: &Path) -> Result<()> {
        let xpl = hddvd::find_playlist(dir).ok_or_else(|| Error::structural("ADV_OBJ/*.xpl", dir))?;
        debug!(playlist = %xpl.display(), "HD DVD playlist");

        let titles = hddvd::parse_with(&xpl, self.config.min_duration_secs)?;
        let candidates = hddvd::candidates(dir, titles);
        let chosen: TitleCandidate = self
            .selector()
            .select(candidates, &self.policy)
            .map_err(|e| at_disc(e, &disc.path))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoCandidates {
                path: disc.path.clone(),
            })?;

        let mut texts = Vec::with_capacity(chosen.evo_files.len());
        for evo in &chosen.evo_files {
            debug!(file = %evo.file.display(), "Inspecting EVO");
            texts.push(clean_text_report(&self.inspector.text(&evo.file)?, &evo.file));
        }

        let title = &chosen.title;
        let total = chosen.evo_files.iter().map(|c| c.size).sum::<u64>();
        let overrides = GeneralOverrides {
            file_size: Some(format!("{:.2} GiB", total as f64 / GIB)),
            duration: Some(hddvd::format_duration(&title.duration)),
        };
        let sources: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut report = merge::merge(&sources, Authority::FirstFile, &overrides);

        let audio_languages = title.audio_languages();
        let subtitle_languages = title.subtitle_languages();
        let chapters = title.chapter_marks();
        report.inject_languages("Audio", &audio_languages);
        report.inject_languages("Text", &subtitle_languages);
        report.inject_chapters(HD_DVD_MENU_FORMAT, &chapters);

        let text = report.render();
        fs::write(self.run_dir.file("MEDIAINFO.txt"), &text)?;

        if let Some(first) = chosen.evo_files.first() {
            let annotations = JsonAnnotations {
                file_size: total,
                duration_millis: hddvd::timecode_millis(&title.duration),
                source_files: chosen
                    .evo_files
                    .iter()
                    .filter_map(|c| c.file.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .collect(),
                audio_languages,
                subtitle_languages,
                chapters,
                menu_format: HD_DVD_MENU_FORMAT.to_string(),
            };
            match self.inspector.json(&first.file) {
                Ok(mut json) => {
                    augment(&mut json, &annotations);
                    let json = serde_json::to_string_pretty(&filter_mediainfo_json(&json))?;
                    fs::write(self.run_dir.file("MEDIAINFO.json"), json)?;
                }
                Err(e) => warn!(error = %e, "No JSON report for the title"),
            }
        }

        info!(title = %title.number, files = chosen.evo_files.len(), "HD DVD title merged");
        disc.title = Some(if title.display_name.is_empty() {
            title.number.clone()
        } else {
            title.display_name.clone()
        });
        disc.mediainfo = Some(text);
        Ok(())
    }

    fn hddvd_largest_evo(&self, disc: &mut Disc, dir: &Path) -> Result<()> {
        let largest = hddvd::largest_evo(dir)?.ok_or_else(|| Error::NoCandidates {
            path: disc.path.clone(),
        })?;
        info!(file = %largest.file.display(), "Largest EVO");

        let text = clean_text_report(&self.inspector.text(&largest.file)?, &largest.file);
        fs::write(self.run_dir.file("MEDIAINFO.txt"), &text)?;
        disc.mediainfo = Some(text);
        Ok(())
    }
}
