//! Main feature detection and metadata reconciliation for optical disc
//! structures.
//!
//! Given a Blu-ray (`BDMV`), DVD (`VIDEO_TS`) or HD DVD (`HVDVD_TS`) folder,
//! this crate finds the playlist or title set that holds the main feature and
//! turns the reports of the usual tools into consistent artifacts:
//!
//! * Blu-ray playlists are decoded by [`mpls`] and filtered by [`bluray`];
//!   BDInfo reports are read by [`bdinfo`].
//! * DVD title sets are grouped by [`dvd`] and picked by duration.
//! * HD DVD XML playlists are read by [`hddvd`].
//! * MediaInfo reports of several files are combined by [`merge`].
//!
//! [`select`] ranks candidates for all disc kinds, and [`pipeline`] ties
//! everything together for a batch of discs.
//!
//! External programs are reached through traits
//! ([`mediainfo::MediaInspector`], [`bdinfo::ReportGenerator`],
//! [`select::SelectionProvider`]), so every stage can run against fakes.
//!
//! # Examples
//! ```no_run
//! # fn main() -> discparse::Result<()> {
//! use std::path::Path;
//! use discparse::bluray;
//!
//! for playlist in bluray::scan(Path::new("/discs/MOVIE/BDMV"))? {
//!     println!("{} {:.0}s {} bytes", playlist.id, playlist.duration, playlist.total_size());
//! }
//! # Ok(())
//! # }
//! ```
#![doc(html_root_url = "https://docs.rs/discparse/0.1.0")]

pub mod bdinfo;
pub mod bluray;
pub mod config;
pub mod dvd;
pub mod error;
pub mod export;
pub mod hddvd;
pub mod language;
pub mod logging;
pub mod mediainfo;
pub mod merge;
pub mod mpls;
pub mod pipeline;
pub mod select;
pub mod types;
pub mod xml;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{DiscOutcome, Pipeline, RunDirectory};
pub use types::*;
