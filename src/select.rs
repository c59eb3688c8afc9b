//! Main feature selection.
//!
//! [`MainFeatureSelector`] works the same for Blu-ray playlists and HD DVD
//! titles: anything implementing [`Candidate`] can be ranked. DVD title sets
//! use [`pick_by_duration_hysteresis`] instead.

use tracing::{debug, info, warn};

use crate::types::Candidate;
use crate::{Error, Result};

/// Shortest duration, in seconds, a main feature can have.
pub const DEFAULT_MIN_DURATION: f64 = 600.0;

/// How many times an interactive provider is asked before giving up.
pub const MAX_PROMPT_ATTEMPTS: usize = 5;

/// A title set replaces the current main set only when it is this much
/// longer.
const HYSTERESIS: f64 = 1.10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// The candidate with the largest total file size.
    LargestOnly,
    /// Candidates by 0-based index into the filtered list.
    Explicit(Vec<usize>),
    All,
    /// Ask the [`SelectionProvider`].
    Interactive,
}

/// What an operator gets to see about a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub index: usize,
    pub label: String,
    pub duration: f64,
    pub size: u64,
    pub description: Option<String>,
}

impl CandidateSummary {
    /// Duration as `1h 45m 30s`.
    pub fn duration_display(&self) -> String {
        let secs = self.duration as u64;
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Interactive choices, typically backed by a console prompt.
pub trait SelectionProvider {
    /// Pick among `candidates`. Must not return [`SelectionPolicy::Interactive`].
    fn choose(&self, candidates: &[CandidateSummary]) -> Result<SelectionPolicy>;

    /// An edition name for a candidate when several were selected; `None`
    /// keeps `current`.
    fn edition_label(&self, candidate: &CandidateSummary, current: &str) -> Option<String>;
}

/// Whether indices in operator input start at 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBase {
    Zero,
    One,
}

/// Interpret operator input.
///
/// `all` selects everything, an empty line the largest candidate, and a
/// comma separated list of numbers the given candidates. Numbers out of
/// range are dropped later by the selector.
pub fn parse_selection_input(text: &str, count: usize, base: IndexBase) -> Result<SelectionPolicy> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("all") {
        return Ok(SelectionPolicy::All);
    }
    if text.is_empty() {
        return Ok(SelectionPolicy::LargestOnly);
    }

    let mut indices = Vec::new();
    for part in text.split(',') {
        let n: i64 = part
            .trim()
            .parse()
            .map_err(|_| Error::Selection(format!("'{}' is not a number", part.trim())))?;
        let idx = match base {
            IndexBase::Zero => n,
            IndexBase::One => n - 1,
        };
        if idx >= 0 && (idx as usize) < count {
            indices.push(idx as usize);
        }
    }
    Ok(SelectionPolicy::Explicit(indices))
}

pub struct MainFeatureSelector<'p> {
    pub min_duration: f64,
    provider: Option<&'p dyn SelectionProvider>,
}

impl<'p> Default for MainFeatureSelector<'p> {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DURATION)
    }
}

impl<'p> MainFeatureSelector<'p> {
    pub fn new(min_duration: f64) -> Self {
        Self {
            min_duration,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: &'p dyn SelectionProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Filter `candidates` and apply `policy`.
    ///
    /// Short and unclean candidates are dropped first. If none remain the
    /// result is [`Error::NoCandidates`]; a single survivor is returned
    /// whatever the policy.
    pub fn select<T: Candidate>(&self, candidates: Vec<T>, policy: &SelectionPolicy) -> Result<Vec<T>> {
        let mut eligible: Vec<T> = candidates
            .into_iter()
            .filter(|c| {
                let keep = c.is_clean() && c.duration() >= self.min_duration;
                if !keep {
                    debug!(candidate = %c.label(), "Dropping candidate");
                }
                keep
            })
            .collect();

        if eligible.is_empty() {
            return Err(Error::NoCandidates {
                path: Default::default(),
            });
        }
        if eligible.len() == 1 {
            info!(candidate = %eligible[0].label(), "Only one candidate, selecting it");
            return Ok(eligible);
        }

        let policy = match policy {
            SelectionPolicy::Interactive => self.ask(&eligible)?,
            other => other.clone(),
        };

        let selected = match policy {
            SelectionPolicy::LargestOnly => {
                let idx = largest(&eligible);
                vec![eligible.swap_remove(idx)]
            }
            SelectionPolicy::All => eligible,
            SelectionPolicy::Explicit(indices) => pick(eligible, &indices)?,
            SelectionPolicy::Interactive => {
                return Err(Error::Selection(
                    "provider answered with another interactive policy".to_string(),
                ))
            }
        };

        for c in &selected {
            info!(candidate = %c.label(), duration = c.duration(), size = c.total_size(), "Selected");
        }
        Ok(selected)
    }

    fn ask<T: Candidate>(&self, eligible: &[T]) -> Result<SelectionPolicy> {
        let provider = self
            .provider
            .ok_or_else(|| Error::Selection("interactive selection without a provider".to_string()))?;
        let summaries = summarize(eligible);

        let mut last_error = None;
        for attempt in 1..=MAX_PROMPT_ATTEMPTS {
            match provider.choose(&summaries) {
                Ok(SelectionPolicy::Explicit(indices)) if valid_indices(&indices, eligible.len()).is_empty() => {
                    warn!(attempt, "Selection matched no candidate");
                    last_error = Some(Error::Selection("no candidate selected".to_string()));
                }
                Ok(policy) => return Ok(policy),
                Err(Error::Selection(msg)) => {
                    warn!(attempt, %msg, "Invalid selection");
                    last_error = Some(Error::Selection(msg));
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Selection("no selection made".to_string())))
    }
}

/// Index of the largest candidate; the first one wins ties.
fn largest<T: Candidate>(candidates: &[T]) -> usize {
    let mut best = 0;
    for (idx, c) in candidates.iter().enumerate().skip(1) {
        if c.total_size() > candidates[best].total_size() {
            best = idx;
        }
    }
    best
}

/// In-range indices without repeats, in the given order.
fn valid_indices(indices: &[usize], len: usize) -> Vec<usize> {
    let mut out: Vec<usize> = Vec::new();
    for &idx in indices {
        if idx < len && !out.contains(&idx) {
            out.push(idx);
        }
    }
    out
}

fn pick<T>(candidates: Vec<T>, indices: &[usize]) -> Result<Vec<T>> {
    let wanted = valid_indices(indices, candidates.len());
    if wanted.is_empty() {
        return Err(Error::Selection("no candidate selected".to_string()));
    }

    let mut slots: Vec<Option<T>> = candidates.into_iter().map(Some).collect();
    Ok(wanted.into_iter().filter_map(|idx| slots[idx].take()).collect())
}

pub fn summarize<T: Candidate>(candidates: &[T]) -> Vec<CandidateSummary> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, c)| CandidateSummary {
            index,
            label: c.label(),
            duration: c.duration(),
            size: c.total_size(),
            description: c.description(),
        })
        .collect()
}

/// Index of the main title set among `durations`, in seconds.
///
/// A later set takes over only if it is more than 10% longer than the
/// current one, so the first of several similar episodes wins.
pub fn pick_by_duration_hysteresis(durations: &[f64]) -> Option<usize> {
    let mut main: Option<(usize, f64)> = None;
    for (idx, &duration) in durations.iter().enumerate() {
        match main {
            Some((_, current)) if duration <= current * HYSTERESIS => {}
            _ => main = Some((idx, duration)),
        }
    }
    main.map(|(idx, _)| idx)
}
