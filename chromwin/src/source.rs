//! Coordinate-indexed sequence and signal sources.
//!
//! Sources come in two flavours, chosen once when the source is built:
//! in-memory arrays keyed by chromosome, which are sliced directly, and
//! external readers (e.g. over FASTA or BigWig files), which are queried
//! through the [`GenomeReader`] and [`TrackReader`] traits.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;

use ndarray::s;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayViewMut1;
use ndarray::ArrayViewMut2;

use super::encode::encode_dna;
use super::err::SourceError;
use super::region::Window;

/// Check a window against a chromosome length and convert it to a range.
fn checked_range(chrom: &str, window: Window, length: usize) -> Result<Range<usize>, SourceError> {
    if window.start < 0 || window.end < window.start || window.end as usize > length {
        Err(SourceError::OutOfBounds {
            chrom: chrom.to_string(),
            start: window.start,
            end: window.end,
            length: Some(length),
        })
    } else {
        Ok(window.start as usize..window.end as usize)
    }
}

/// Check that a window does not start before the chromosome.
fn checked_coordinates(chrom: &str, window: Window) -> Result<(u64, u64), SourceError> {
    if window.start < 0 || window.end < window.start {
        Err(SourceError::OutOfBounds {
            chrom: chrom.to_string(),
            start: window.start,
            end: window.end,
            length: None,
        })
    } else {
        Ok((window.start as u64, window.end as u64))
    }
}

// --- GenomeReader ------------------------------------------------------------

/// A random-access reader over raw genome text.
pub trait GenomeReader: Send + Sync {
    /// Get the text of the half-open interval `start..end` of `chrom`.
    ///
    /// Implementors must fail with [`SourceError::UnknownChromosome`] for
    /// chromosomes they do not know, and should fail with
    /// [`SourceError::OutOfBounds`] for intervals past the chromosome end.
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Cow<'_, [u8]>, SourceError>;
}

impl GenomeReader for HashMap<String, String> {
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Cow<'_, [u8]>, SourceError> {
        let text = self
            .get(chrom)
            .ok_or_else(|| SourceError::UnknownChromosome(chrom.to_string()))?;
        let window = Window {
            start: start as i64,
            end: end as i64,
        };
        let range = checked_range(chrom, window, text.len())?;
        Ok(Cow::Borrowed(&text.as_bytes()[range]))
    }
}

// --- TrackReader -------------------------------------------------------------

/// A random-access reader over a numeric genome track.
pub trait TrackReader: Send + Sync {
    /// Get the values of the half-open interval `start..end` of `chrom`.
    ///
    /// Undefined positions may be reported as `NaN`.
    fn values(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<f32>, SourceError>;
}

// --- Genome ------------------------------------------------------------------

/// A genome sequence addressable by coordinates.
pub enum Genome {
    /// Pre-encoded arrays of shape `(length, alphabet_size)` per chromosome.
    Encoded(HashMap<String, Array2<f32>>),
    /// Raw text, encoded with the [`Dna`](crate::abc::Dna) alphabet.
    Text(Box<dyn GenomeReader>),
}

impl Genome {
    /// Create a genome from pre-encoded arrays.
    pub fn encoded(chroms: HashMap<String, Array2<f32>>) -> Self {
        Genome::Encoded(chroms)
    }

    /// Create a genome from a raw text reader.
    pub fn text<R: GenomeReader + 'static>(reader: R) -> Self {
        Genome::Text(Box::new(reader))
    }

    /// The number of channels of the one-hot encoding, when known.
    ///
    /// Text genomes always use 4 channels; for pre-encoded genomes this is
    /// the width of the first array, or `None` if there is none.
    pub fn channels(&self) -> Option<usize> {
        match self {
            Genome::Encoded(chroms) => chroms.values().next().map(|a| a.ncols()),
            Genome::Text(_) => Some(4),
        }
    }

    /// Write the one-hot encoding of a window into `out`.
    ///
    /// `out` must have shape `(alphabet_size, window.len())`.
    pub fn one_hot_into(
        &self,
        chrom: &str,
        window: Window,
        mut out: ArrayViewMut2<'_, f32>,
    ) -> Result<(), SourceError> {
        match self {
            Genome::Encoded(chroms) => {
                let array = chroms
                    .get(chrom)
                    .ok_or_else(|| SourceError::UnknownChromosome(chrom.to_string()))?;
                let range = checked_range(chrom, window, array.nrows())?;
                if array.ncols() != out.nrows() {
                    return Err(SourceError::Other(format!(
                        "chromosome {:?} is encoded with {} channels, expected {}",
                        chrom,
                        array.ncols(),
                        out.nrows()
                    )));
                }
                out.assign(&array.slice(s![range, ..]).t());
            }
            Genome::Text(reader) => {
                let (start, end) = checked_coordinates(chrom, window)?;
                let text = reader.fetch(chrom, start, end)?;
                if text.len() != window.len() {
                    return Err(SourceError::Other(format!(
                        "reader returned {} bases for a window of {}",
                        text.len(),
                        window.len()
                    )));
                }
                out.assign(&encode_dna::<f32>(&text));
            }
        }
        Ok(())
    }
}

// --- Track -------------------------------------------------------------------

/// A numeric genome track addressable by coordinates.
pub enum Track {
    /// In-memory values per chromosome, sliced as-is.
    Array(HashMap<String, Vec<f32>>),
    /// An external reader; undefined values are replaced with zero.
    Reader(Box<dyn TrackReader>),
}

impl Track {
    /// Create a track from in-memory values.
    pub fn array(chroms: HashMap<String, Vec<f32>>) -> Self {
        Track::Array(chroms)
    }

    /// Create a track from an external reader.
    pub fn reader<R: TrackReader + 'static>(reader: R) -> Self {
        Track::Reader(Box::new(reader))
    }

    /// Write the values of a window into `out`.
    ///
    /// Returns the number of undefined values that were replaced with zero.
    pub fn values_into(
        &self,
        chrom: &str,
        window: Window,
        mut out: ArrayViewMut1<'_, f32>,
    ) -> Result<usize, SourceError> {
        match self {
            Track::Array(chroms) => {
                let values = chroms
                    .get(chrom)
                    .ok_or_else(|| SourceError::UnknownChromosome(chrom.to_string()))?;
                let range = checked_range(chrom, window, values.len())?;
                out.assign(&ArrayView1::from(&values[range]));
                Ok(0)
            }
            Track::Reader(reader) => {
                let (start, end) = checked_coordinates(chrom, window)?;
                let values = reader.values(chrom, start, end)?;
                if values.len() != window.len() {
                    return Err(SourceError::Other(format!(
                        "reader returned {} values for a window of {}",
                        values.len(),
                        window.len()
                    )));
                }
                let mut missing = 0;
                for (dst, &x) in out.iter_mut().zip(values.iter()) {
                    if x.is_nan() {
                        *dst = 0.0;
                        missing += 1;
                    } else {
                        *dst = x;
                    }
                }
                Ok(missing)
            }
        }
    }
}
