//! Error types for encoding, extraction, sampling and attribution.

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use super::region::Peak;

// --- UnknownSymbol -----------------------------------------------------------

/// A symbol was not found in an explicitly supplied alphabet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownSymbol {
    /// The offending symbol, rendered with its `Debug` implementation.
    pub symbol: String,
    /// The position of the symbol in the encoded sequence.
    pub position: usize,
}

impl Display for UnknownSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "unknown symbol {} at position {}",
            self.symbol, self.position
        )
    }
}

impl std::error::Error for UnknownSymbol {}

// --- InvalidConfig -----------------------------------------------------------

/// A configuration value was rejected before any work started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidConfig(pub String);

impl Display for InvalidConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl std::error::Error for InvalidConfig {}

// --- SourceError -------------------------------------------------------------

/// A coordinate-indexed source failed to answer a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// The chromosome is not present in the source.
    UnknownChromosome(String),
    /// The queried interval does not fit in the chromosome.
    OutOfBounds {
        chrom: String,
        start: i64,
        end: i64,
        length: Option<usize>,
    },
    /// Any other failure reported by an external reader.
    Other(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SourceError::UnknownChromosome(chrom) => write!(f, "unknown chromosome {:?}", chrom),
            SourceError::OutOfBounds {
                chrom,
                start,
                end,
                length,
            } => {
                write!(f, "interval {}:{}-{} out of bounds", chrom, start, end)?;
                if let Some(length) = length {
                    write!(f, " (chromosome length {})", length)?;
                }
                Ok(())
            }
            SourceError::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for SourceError {}

// --- Origin ------------------------------------------------------------------

/// The source a failing query was addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Sequence,
    Signal(usize),
    Control(usize),
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Origin::Sequence => f.write_str("sequence"),
            Origin::Signal(i) => write!(f, "signal track {}", i),
            Origin::Control(i) => write!(f, "control track {}", i),
        }
    }
}

// --- Error -------------------------------------------------------------------

/// The crate-level error type.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Config(InvalidConfig),
    Symbol(UnknownSymbol),
    /// A source query failed while extracting a given row.
    Source {
        row: usize,
        peak: Peak,
        origin: Origin,
        error: SourceError,
    },
    /// An external collaborator returned a tensor of the wrong shape.
    Shape(String),
}

impl Error {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(InvalidConfig(msg.into()))
    }
}

impl From<InvalidConfig> for Error {
    fn from(error: InvalidConfig) -> Self {
        Error::Config(error)
    }
}

impl From<UnknownSymbol> for Error {
    fn from(error: UnknownSymbol) -> Self {
        Error::Symbol(error)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Symbol(err) => err.fmt(f),
            Error::Source {
                row,
                peak,
                origin,
                error,
            } => write!(f, "row {} (peak {}), {}: {}", row, peak, origin, error),
            Error::Shape(msg) => write!(f, "shape mismatch: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Symbol(e) => Some(e),
            Error::Source { error, .. } => Some(error),
            Error::Shape(_) => None,
        }
    }
}
