use std::{error::Error, fmt::Display};

/// The error type of [`Mpls::parse`] and [`Mpls::from`].
///
/// [`Mpls::parse`]: super::Mpls::parse
/// [`Mpls::from`]: super::Mpls::from
#[derive(Debug)]
pub enum MplsError {
    /// An I/O error occurred while reading the container.
    IoError(std::io::Error),
    /// A section of the byte stream is not valid MPLS.
    ParseError(&'static str),
    /// The header points at a section beyond the end of the buffer.
    OffsetOutOfRange { section: &'static str, offset: u32 },
}

impl Error for MplsError {}

impl Display for MplsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MplsError::IoError(e) => write!(f, "{}", e),
            MplsError::ParseError(section) => {
                write!(f, "failed to parse {} as valid MPLS", section)
            }
            MplsError::OffsetOutOfRange { section, offset } => {
                write!(f, "{} offset {} is past the end of the file", section, offset)
            }
        }
    }
}

impl From<std::io::Error> for MplsError {
    fn from(err: std::io::Error) -> Self {
        MplsError::IoError(err)
    }
}
