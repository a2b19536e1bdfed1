//! Random augmented sampling of training examples.
//!
//! A [`Sampler`] cuts model-sized windows out of the wider windows produced
//! by [`extract`](crate::extract::extract), at a random jitter offset and
//! optionally on the reverse strand.

use std::marker::PhantomData;

use ndarray::s;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::ArrayView3;
use rand::distributions::Distribution;
use rand::distributions::Uniform;
use rand::Rng;
use typenum::marker_traits::Unsigned;

use super::abc::ComplementableAlphabet;
use super::config::SamplerConfig;
use super::err::Error;
use super::extract::WindowedExamples;

/// Reverse a one-hot tensor along both its channel and position axes.
///
/// For an alphabet where [`reversal_is_complement`] holds, this is the
/// reverse complement of the sequence. Applied twice, it returns the
/// original tensor.
///
/// [`reversal_is_complement`]: crate::abc::ComplementableAlphabet::reversal_is_complement
pub fn reverse_complement<T: Clone>(view: ArrayView2<'_, T>) -> Array2<T> {
    view.slice(s![..;-1, ..;-1]).to_owned()
}

// --- Example -----------------------------------------------------------------

/// A single training example, with the draw that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    /// The one-hot sequence, of shape `(alphabet_size, in_window)`.
    pub sequence: Array2<f32>,
    /// The controls, of shape `(control_tracks, in_window)`, if any.
    pub control: Option<Array2<f32>>,
    /// The signals, of shape `(signal_tracks, out_window)`.
    pub signal: Array2<f32>,
    /// The row of the example set the example was cut from.
    pub row: usize,
    /// The offset of the window inside the extracted row.
    pub jitter: usize,
    /// Whether the example was reverse complemented.
    pub reversed: bool,
}

// --- Sampler -----------------------------------------------------------------

/// A random generator of augmented examples over a shared example set.
///
/// The sampler reports a nominal size, the number of rows, so it can be
/// used with collaborators that count epochs, but it never enumerates rows:
/// every draw picks a row uniformly at random, with replacement.
///
/// The example set is only ever read. Workers sampling concurrently should
/// each own a sampler, created with [`Sampler::new`] or [`Sampler::fork`],
/// with their own random number generator.
#[derive(Debug)]
pub struct Sampler<'a, A: ComplementableAlphabet, R: Rng> {
    /// A reference to the sampled data.
    data: &'a WindowedExamples,
    /// The random number generator.
    rng: R,

    // -- Parameters ----------------------------
    in_window: usize,
    out_window: usize,
    max_jitter: usize,
    reverse_complement: bool,

    // -- Internal data -------------------------
    rows: Uniform<usize>,
    alphabet: PhantomData<A>,
}

impl<'a, A, R> Sampler<'a, A, R>
where
    A: ComplementableAlphabet,
    R: Rng,
{
    /// Create a new sampler over `data`.
    ///
    /// # Errors
    /// Fails with a configuration error when the windows are invalid, when
    /// the tensor widths do not match the configured windows, when the
    /// sequences do not have one channel per symbol of `A`, or when reverse
    /// complement is enabled for an alphabet where reversing the channels
    /// is not a complement.
    pub fn new(data: &'a WindowedExamples, config: SamplerConfig, rng: R) -> Result<Self, Error> {
        let window = config.window;
        window.validate()?;
        if data.is_empty() {
            return Err(Error::config("cannot sample from an empty example set"));
        }

        Self::check_width("sequences", data.sequences(), window.input_width())?;
        Self::check_width("signals", data.signals(), window.output_width())?;
        if let Some(controls) = data.controls() {
            Self::check_width("controls", controls, window.input_width())?;
        }

        let k = data.sequences().dim().1;
        if k != A::K::USIZE {
            return Err(Error::config(format!(
                "sequences have {} channels, alphabet {:?} has {}",
                k,
                A::as_str(),
                A::K::USIZE
            )));
        }
        if config.reverse_complement && !A::reversal_is_complement() {
            return Err(Error::config(format!(
                "reversing the channels of alphabet {:?} does not complement them",
                A::as_str()
            )));
        }

        log::debug!(
            "sampling {} rows, windows {}/{} with jitter {}, reverse complement: {}",
            data.len(),
            window.in_window,
            window.out_window,
            window.max_jitter,
            config.reverse_complement
        );
        Ok(Self {
            data,
            rng,
            in_window: window.in_window,
            out_window: window.out_window,
            max_jitter: window.max_jitter,
            reverse_complement: config.reverse_complement,
            rows: Uniform::new(0, data.len()),
            alphabet: PhantomData,
        })
    }

    fn check_width(name: &str, tensor: ArrayView3<'_, f32>, width: usize) -> Result<(), Error> {
        let actual = tensor.dim().2;
        if actual != width {
            Err(Error::config(format!(
                "{} are {} positions wide, expected {}",
                name, actual, width
            )))
        } else {
            Ok(())
        }
    }

    /// Create a sampler over the same data with another generator.
    pub fn fork<Q: Rng>(&self, rng: Q) -> Sampler<'a, A, Q> {
        Sampler {
            data: self.data,
            rng,
            in_window: self.in_window,
            out_window: self.out_window,
            max_jitter: self.max_jitter,
            reverse_complement: self.reverse_complement,
            rows: Uniform::new(0, self.data.len()),
            alphabet: PhantomData,
        }
    }

    /// The nominal size of the sampler, i.e. the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Draw an example.
    ///
    /// `index` is ignored: the row is drawn at random like in
    /// [`Sampler::sample`], and accessing the same index twice will most
    /// likely return different examples.
    #[inline]
    pub fn get(&mut self, _index: usize) -> Example {
        self.sample()
    }

    /// Draw an example.
    pub fn sample(&mut self) -> Example {
        let row = self.rows.sample(&mut self.rng);
        let jitter = if self.max_jitter == 0 {
            0
        } else {
            self.rng.gen_range(0..2 * self.max_jitter)
        };
        let reversed = self.reverse_complement && self.rng.gen_bool(0.5);
        log::trace!("row {}, jitter {}, reversed: {}", row, jitter, reversed);

        let inputs = jitter..jitter + self.in_window;
        let outputs = jitter..jitter + self.out_window;
        let sequence = self.data.sequences();
        let sequence = sequence.slice(s![row, .., inputs.clone()]);
        let signal = self.data.signals();
        let signal = signal.slice(s![row, .., outputs]);
        let control = self.data.controls();
        let control = control.as_ref().map(|c| c.slice(s![row, .., inputs]));

        let transform = |view: ArrayView2<'_, f32>| {
            if reversed {
                reverse_complement(view)
            } else {
                view.to_owned()
            }
        };
        Example {
            sequence: transform(sequence),
            control: control.map(|c| transform(c)),
            signal: transform(signal),
            row,
            jitter,
            reversed,
        }
    }
}

impl<'a, A, R> Iterator for Sampler<'a, A, R>
where
    A: ComplementableAlphabet,
    R: Rng,
{
    type Item = Example;
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sample())
    }
}
