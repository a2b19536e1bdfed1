//! Peak regions and the coordinate windows centred on them.

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use super::err::InvalidConfig;

// --- Peak --------------------------------------------------------------------

/// A half-open genomic interval of interest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Peak {
    chrom: String,
    start: u64,
    end: u64,
}

impl Peak {
    /// Create a new peak, checking that `start <= end`.
    pub fn new<S: Into<String>>(chrom: S, start: u64, end: u64) -> Result<Self, InvalidConfig> {
        let chrom = chrom.into();
        if start > end {
            return Err(InvalidConfig(format!(
                "peak {}:{}-{} ends before it starts",
                chrom, start, end
            )));
        }
        Ok(Self { chrom, start, end })
    }

    /// The chromosome of the peak.
    #[inline]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// The midpoint of the peak, rounded towards the start.
    #[inline]
    pub fn midpoint(&self) -> u64 {
        self.start + (self.end - self.start) / 2
    }

    /// The window of width `width + 2 * jitter` centred on the midpoint.
    ///
    /// The window spans `width / 2 + jitter` positions on either side of the
    /// midpoint, so odd widths are rounded down to the next even number.
    /// Coordinates saturate at the bounds of `i64`.
    pub fn window(&self, width: usize, jitter: usize) -> Window {
        let mid = i64::try_from(self.midpoint()).unwrap_or(i64::MAX);
        let flank = i64::try_from((width / 2).saturating_add(jitter)).unwrap_or(i64::MAX);
        Window {
            start: mid.saturating_sub(flank),
            end: mid.saturating_add(flank),
        }
    }
}

impl Display for Peak {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

// --- Window ------------------------------------------------------------------

/// A half-open coordinate interval, possibly starting before the chromosome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    /// The number of positions in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start).max(0) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_peak_invalid() {
        assert!(Peak::new("chr1", 10, 5).is_err());
        assert!(Peak::new("chr1", 10, 10).is_ok());
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(Peak::new("chr1", 1000, 1000).unwrap().midpoint(), 1000);
        assert_eq!(Peak::new("chr1", 100, 201).unwrap().midpoint(), 150);
        assert_eq!(Peak::new("chr1", 100, 202).unwrap().midpoint(), 151);
    }

    #[test]
    fn test_window() {
        let peak = Peak::new("chr1", 1000, 1000).unwrap();
        let out = peak.window(2, 1);
        assert_eq!(out, Window { start: 998, end: 1002 });
        assert_eq!(out.len(), 4);
        let inp = peak.window(4, 1);
        assert_eq!(inp, Window { start: 997, end: 1003 });
        assert_eq!(inp.len(), 6);
    }

    #[test]
    fn test_window_before_start() {
        let peak = Peak::new("chrM", 0, 10).unwrap();
        let w = peak.window(20, 2);
        assert_eq!(w.start, -7);
        assert_eq!(w.len(), 24);
    }

    #[test]
    fn test_window_saturates() {
        let peak = Peak::new("chr1", u64::MAX - 1, u64::MAX).unwrap();
        let w = peak.window(usize::MAX, usize::MAX);
        assert_eq!(w.end, i64::MAX);
        assert_eq!(w.start, 0);
        assert!(w.start <= w.end);

        let w = Peak::new("chr1", 0, 0).unwrap().window(usize::MAX, 1);
        assert_eq!(w.start, -i64::MAX);
        assert_eq!(w.end, i64::MAX);
        assert_eq!(w.len(), i64::MAX as usize);
    }
}
