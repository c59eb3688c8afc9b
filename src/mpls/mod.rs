//! A movie playlist file (MPLS) decoder.
//!
//! The entry point is the [`Mpls`] struct, obtained through [`Mpls::parse`]
//! or [`Mpls::from`]. The decoder reads the fixed header first and then
//! jumps to the playlist and mark sections at the absolute offsets the header
//! names.
//!
//! The MPLS file format is not officially documented. The layout used here
//! follows the third-party specs in the [lw/BluRay] repository and the
//! [bdinfo/mpls] Wikibooks page.
//!
//! [lw/BluRay]: https://github.com/lw/BluRay/wiki/MPLS
//! [bdinfo/mpls]: https://en.wikibooks.org/wiki/User:Bdinfo/mpls
//!
//! # Examples
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use discparse::mpls::Mpls;
//!
//! let bytes = std::fs::read("BDMV/PLAYLIST/00800.mpls")?;
//! let mpls = Mpls::parse(&bytes)?;
//!
//! for item in &mpls.play_list.play_items {
//!     println!("{} ({:.1}s)", item.clip.stream_file_name(), item.duration());
//! }
//! println!("{} chapters", mpls.chapters().len());
//! # Ok(())
//! # }
//! ```
mod error;
mod parser;
mod types;

pub use error::MplsError;
pub use types::*;
