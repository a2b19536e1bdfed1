//! Configuration of extraction, sampling and attribution.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::attr::OutputSelector;
use super::err::InvalidConfig;

/// The default width of model inputs.
pub const DEFAULT_IN_WINDOW: usize = 2114;
/// The default width of model outputs.
pub const DEFAULT_OUT_WINDOW: usize = 1000;
/// The default maximum jitter, in either direction.
pub const DEFAULT_MAX_JITTER: usize = 128;
/// The default number of shuffled references per attributed sequence.
pub const DEFAULT_N_SHUFFLES: usize = 10;

/// The largest window width, so that coordinates fit in an `i64`.
pub const MAX_WIDTH: usize = (i64::MAX / 4) as usize;

/// Create a random number generator, seeded when `seed` is given.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

// --- WindowConfig ------------------------------------------------------------

/// The input and output window widths, and the jitter around them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    pub in_window: usize,
    pub out_window: usize,
    pub max_jitter: usize,
}

impl WindowConfig {
    pub fn new(in_window: usize, out_window: usize, max_jitter: usize) -> Self {
        Self {
            in_window,
            out_window,
            max_jitter,
        }
    }

    /// The width of extracted sequences and controls.
    #[inline]
    pub fn input_width(&self) -> usize {
        Self::widened(self.in_window, self.max_jitter)
    }

    /// The width of extracted signals.
    #[inline]
    pub fn output_width(&self) -> usize {
        Self::widened(self.out_window, self.max_jitter)
    }

    #[inline]
    fn widened(width: usize, jitter: usize) -> usize {
        jitter.saturating_mul(2).saturating_add(width)
    }

    /// Check the windows can be centred on a peak midpoint.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        for (name, width) in [("in_window", self.in_window), ("out_window", self.out_window)] {
            if width == 0 {
                return Err(InvalidConfig(format!("{} must be non-zero", name)));
            }
            if width % 2 != 0 {
                return Err(InvalidConfig(format!(
                    "{} must be even, got {}",
                    name, width
                )));
            }
            if Self::widened(width, self.max_jitter) > MAX_WIDTH {
                return Err(InvalidConfig(format!(
                    "{} of {} with a jitter of {} exceeds the maximum width of {}",
                    name, width, self.max_jitter, MAX_WIDTH
                )));
            }
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(DEFAULT_IN_WINDOW, DEFAULT_OUT_WINDOW, DEFAULT_MAX_JITTER)
    }
}

// --- ExtractConfig -----------------------------------------------------------

/// Parameters of peak window extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractConfig {
    pub window: WindowConfig,
    /// The chromosomes to keep peaks from, or `None` to keep all of them.
    pub chroms: Option<Vec<String>>,
}

impl ExtractConfig {
    pub fn new(window: WindowConfig) -> Self {
        Self {
            window,
            chroms: None,
        }
    }

    /// Restrict extraction to peaks on the given chromosomes.
    pub fn with_chroms<I, S>(mut self, chroms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chroms = Some(chroms.into_iter().map(Into::into).collect());
        self
    }

    /// Check whether peaks on `chrom` are extracted.
    pub fn keeps(&self, chrom: &str) -> bool {
        match &self.chroms {
            Some(chroms) => chroms.iter().any(|c| c == chrom),
            None => true,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        self.window.validate()?;
        if let Some(chroms) = &self.chroms {
            if chroms.is_empty() {
                return Err(InvalidConfig(
                    "empty chromosome filter, use `None` to keep all chromosomes".into(),
                ));
            }
        }
        Ok(())
    }
}

// --- SamplerConfig -----------------------------------------------------------

/// Parameters of augmented window sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerConfig {
    pub window: WindowConfig,
    /// Whether to reverse complement half of the examples.
    pub reverse_complement: bool,
}

impl SamplerConfig {
    pub fn new(window: WindowConfig) -> Self {
        Self {
            window,
            reverse_complement: true,
        }
    }

    pub fn with_reverse_complement(mut self, reverse_complement: bool) -> Self {
        self.reverse_complement = reverse_complement;
        self
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}

// --- AttributionConfig -------------------------------------------------------

/// Parameters of attribution against shuffled references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributionConfig {
    /// The model output to attribute.
    pub output: OutputSelector,
    /// The number of shuffled references per attributed sequence.
    pub n_shuffles: usize,
}

impl AttributionConfig {
    pub fn new(output: OutputSelector) -> Self {
        Self {
            output,
            n_shuffles: DEFAULT_N_SHUFFLES,
        }
    }

    pub fn with_n_shuffles(mut self, n_shuffles: usize) -> Self {
        self.n_shuffles = n_shuffles;
        self
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.n_shuffles == 0 {
            return Err(InvalidConfig(
                "at least one shuffled reference is required".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self::new(OutputSelector::default())
    }
}
