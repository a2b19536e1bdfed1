//! Extraction of fixed-width windows around peaks.
//!
//! Windows are extracted wider than the model windows by `2 * max_jitter`,
//! so that jittered windows can later be cut out of them without querying
//! the sources again (see [`Sampler`](crate::sampler::Sampler)).

use ndarray::s;
use ndarray::Array3;
use ndarray::ArrayView3;
use ndarray::Axis;

use super::config::ExtractConfig;
use super::err::Error;
use super::err::InvalidConfig;
use super::err::Origin;
use super::err::SourceError;
use super::region::Peak;
use super::source::Genome;
use super::source::Track;

// --- WindowedExamples --------------------------------------------------------

/// Row-aligned sequence, signal and control windows.
///
/// Row `i` of every tensor was extracted around the same peak.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowedExamples {
    sequences: Array3<f32>,
    signals: Array3<f32>,
    controls: Option<Array3<f32>>,
}

impl WindowedExamples {
    /// Create a new example set from existing tensors.
    ///
    /// All tensors must have the same number of rows.
    pub fn new(
        sequences: Array3<f32>,
        signals: Array3<f32>,
        controls: Option<Array3<f32>>,
    ) -> Result<Self, InvalidConfig> {
        let n = sequences.len_of(Axis(0));
        let mismatch = signals.len_of(Axis(0)) != n
            || controls
                .as_ref()
                .map(|c| c.len_of(Axis(0)) != n)
                .unwrap_or(false);
        if mismatch {
            return Err(InvalidConfig(format!(
                "tensors have different row counts: {} sequences, {} signals, {} controls",
                n,
                signals.len_of(Axis(0)),
                controls
                    .as_ref()
                    .map(|c| c.len_of(Axis(0)).to_string())
                    .unwrap_or_else(|| "no".into()),
            )));
        }
        Ok(Self {
            sequences,
            signals,
            controls,
        })
    }

    /// The number of examples.
    #[inline]
    pub fn len(&self) -> usize {
        self.sequences.len_of(Axis(0))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The one-hot sequences, of shape `(n, alphabet_size, input_width)`.
    #[inline]
    pub fn sequences(&self) -> ArrayView3<'_, f32> {
        self.sequences.view()
    }

    /// The signals, of shape `(n, signal_tracks, output_width)`.
    #[inline]
    pub fn signals(&self) -> ArrayView3<'_, f32> {
        self.signals.view()
    }

    /// The controls, of shape `(n, control_tracks, input_width)`, if any.
    #[inline]
    pub fn controls(&self) -> Option<ArrayView3<'_, f32>> {
        self.controls.as_ref().map(|c| c.view())
    }

    /// Extract the underlying tensors.
    pub fn into_inner(self) -> (Array3<f32>, Array3<f32>, Option<Array3<f32>>) {
        (self.sequences, self.signals, self.controls)
    }
}

// --- extract -----------------------------------------------------------------

/// Extract windows around every peak kept by the configuration.
///
/// Signals are extracted over the output window, sequences and controls
/// over the input window, both widened by `max_jitter` on either side and
/// centred on the peak midpoint. Rows follow the order of `peaks`, after
/// the optional chromosome filter.
///
/// # Errors
/// Configuration errors are reported before any source is queried. Source
/// errors abort the extraction and report the row and peak that failed;
/// no peak is ever skipped.
pub fn extract(
    peaks: &[Peak],
    genome: &Genome,
    signals: &[Track],
    controls: Option<&[Track]>,
    config: &ExtractConfig,
) -> Result<WindowedExamples, Error> {
    config.validate()?;
    if signals.is_empty() {
        return Err(Error::config("at least one signal track is required"));
    }
    if controls.map(|c| c.is_empty()).unwrap_or(false) {
        return Err(Error::config(
            "empty control track list, use `None` to extract no controls",
        ));
    }
    let k = genome
        .channels()
        .ok_or_else(|| Error::config("genome contains no chromosome"))?;

    let window = config.window;
    let retained = peaks
        .iter()
        .filter(|p| config.keeps(p.chrom()))
        .collect::<Vec<&Peak>>();
    let n = retained.len();
    log::debug!("extracting {} of {} peaks", n, peaks.len());

    let mut seqs = Array3::zeros((n, k, window.input_width()));
    let mut sigs = Array3::zeros((n, signals.len(), window.output_width()));
    let mut ctls = controls.map(|c| Array3::zeros((n, c.len(), window.input_width())));

    let mut missing = 0;
    for (row, &peak) in retained.iter().enumerate() {
        let locate = |origin: Origin| {
            move |error: SourceError| Error::Source {
                row,
                peak: peak.clone(),
                origin,
                error,
            }
        };
        let chrom = peak.chrom();
        log::trace!("row {}: {}", row, peak);

        let out_window = peak.window(window.out_window, window.max_jitter);
        for (t, track) in signals.iter().enumerate() {
            missing += track
                .values_into(chrom, out_window, sigs.slice_mut(s![row, t, ..]))
                .map_err(locate(Origin::Signal(t)))?;
        }

        let in_window = peak.window(window.in_window, window.max_jitter);
        if let (Some(tracks), Some(array)) = (controls, ctls.as_mut()) {
            for (t, track) in tracks.iter().enumerate() {
                missing += track
                    .values_into(chrom, in_window, array.slice_mut(s![row, t, ..]))
                    .map_err(locate(Origin::Control(t)))?;
            }
        }

        genome
            .one_hot_into(chrom, in_window, seqs.slice_mut(s![row, .., ..]))
            .map_err(locate(Origin::Sequence))?;
    }

    if missing > 0 {
        log::debug!("replaced {} undefined track values with zero", missing);
    }
    log::debug!(
        "extracted sequences {:?}, signals {:?}, controls {:?}",
        seqs.dim(),
        sigs.dim(),
        ctls.as_ref().map(|c| c.dim())
    );

    Ok(WindowedExamples {
        sequences: seqs,
        signals: sigs,
        controls: ctls,
    })
}
