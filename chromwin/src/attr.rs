//! Attribution of model outputs against shuffled references.
//!
//! The attribution algorithm itself is an external [`Explainer`]: this
//! module only builds the reference sequences, reduces the model outputs
//! to a single value per example, and masks the attributions to the
//! observed symbols.

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

use ndarray::s;
use ndarray::Array2;
use ndarray::Array3;
use ndarray::ArrayView3;
use ndarray::Axis;
use rand::Rng;

use super::config::AttributionConfig;
use super::err::Error;
use super::err::InvalidConfig;
use super::shuffle::shuffle;

// --- Model -------------------------------------------------------------------

/// The outputs of a profile model on a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelOutput {
    /// The profile logits, of shape `(batch, tracks, out_window)`.
    pub profile: Array3<f32>,
    /// The predicted counts, of shape `(batch, tracks)`.
    pub counts: Array2<f32>,
}

/// A trained model predicting a profile and counts from one-hot sequences.
pub trait Model {
    /// Run the model on a batch of shape `(batch, alphabet_size, in_window)`.
    ///
    /// `args` are additional inputs, e.g. control tracks, with one row per
    /// example of the batch.
    fn forward(
        &self,
        input: ArrayView3<'_, f32>,
        args: &[ArrayView3<'_, f32>],
    ) -> Result<ModelOutput, Error>;
}

/// A model reduced to a single output tensor of shape `(batch, outputs)`.
pub trait Forward {
    fn forward(
        &self,
        input: ArrayView3<'_, f32>,
        args: &[ArrayView3<'_, f32>],
    ) -> Result<Array2<f32>, Error>;
}

fn check_batch(name: &str, actual: usize, expected: usize) -> Result<(), Error> {
    if actual != expected {
        Err(Error::Shape(format!(
            "model returned {} {} rows for a batch of {}",
            actual, name, expected
        )))
    } else {
        Ok(())
    }
}

// --- ProfileWrapper ----------------------------------------------------------

/// Reduce the profile output to its softmax-weighted logit sum.
///
/// For the flattened logits `l` of an example, the output is the single
/// value `sum(l * softmax(l))`.
pub struct ProfileWrapper<'m, M: Model + ?Sized> {
    model: &'m M,
}

impl<'m, M: Model + ?Sized> ProfileWrapper<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }
}

impl<'m, M: Model + ?Sized> Forward for ProfileWrapper<'m, M> {
    fn forward(
        &self,
        input: ArrayView3<'_, f32>,
        args: &[ArrayView3<'_, f32>],
    ) -> Result<Array2<f32>, Error> {
        let batch = input.len_of(Axis(0));
        let output = self.model.forward(input, args)?;
        check_batch("profile", output.profile.len_of(Axis(0)), batch)?;

        let mut reduced = Array2::zeros((batch, 1));
        for (i, logits) in output.profile.axis_iter(Axis(0)).enumerate() {
            let max = logits.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
            let ln_sum = logits.fold(0.0, |s, &x| s + (x - max).exp()).ln();
            // shift by the maximum before the sum, so large logits keep their precision
            reduced[[i, 0]] = logits.fold(0.0, |s, &x| s + x * ((x - max) - ln_sum).exp());
        }
        Ok(reduced)
    }
}

// --- CountWrapper ------------------------------------------------------------

/// Select the count output of a model unmodified.
pub struct CountWrapper<'m, M: Model + ?Sized> {
    model: &'m M,
}

impl<'m, M: Model + ?Sized> CountWrapper<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }
}

impl<'m, M: Model + ?Sized> Forward for CountWrapper<'m, M> {
    fn forward(
        &self,
        input: ArrayView3<'_, f32>,
        args: &[ArrayView3<'_, f32>],
    ) -> Result<Array2<f32>, Error> {
        let batch = input.len_of(Axis(0));
        let output = self.model.forward(input, args)?;
        check_batch("counts", output.counts.len_of(Axis(0)), batch)?;
        Ok(output.counts)
    }
}

// --- Explainer ---------------------------------------------------------------

/// An attribution algorithm explaining a model against reference inputs.
pub trait Explainer {
    /// Attribute the `target` output of `model` on `input`.
    ///
    /// `input` has shape `(1, alphabet_size, length)` and `baselines` has
    /// shape `(n_baselines, alphabet_size, length)`. The attributions must
    /// have the same shape as `input`.
    fn attribute(
        &self,
        model: &dyn Forward,
        input: ArrayView3<'_, f32>,
        baselines: ArrayView3<'_, f32>,
        target: usize,
        args: &[ArrayView3<'_, f32>],
    ) -> Result<Array3<f32>, Error>;
}

// --- OutputSelector ----------------------------------------------------------

/// The model output attributions are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSelector {
    /// The profile, reduced with a [`ProfileWrapper`].
    #[default]
    Profile,
    /// The counts, selected with a [`CountWrapper`].
    Count,
}

impl FromStr for OutputSelector {
    type Err = InvalidConfig;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(OutputSelector::Profile),
            "count" => Ok(OutputSelector::Count),
            other => Err(InvalidConfig(format!(
                "model output must be one of \"profile\" or \"count\", got {:?}",
                other
            ))),
        }
    }
}

impl Display for OutputSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutputSelector::Profile => f.write_str("profile"),
            OutputSelector::Count => f.write_str("count"),
        }
    }
}

// --- compute -----------------------------------------------------------------

/// Compute attributions for every sequence of `inputs`.
///
/// Each sequence of `inputs`, of shape `(n, alphabet_size, length)`, is
/// explained against `config.n_shuffles` dinucleotide shuffles of itself,
/// with the rows of `args` belonging to it. Attributions are multiplied by
/// the input, so that only observed symbols keep a non-zero attribution.
///
/// # Errors
/// Fails with a configuration error before calling the model when
/// `config.n_shuffles` is zero or an argument does not have one row per
/// input. Errors from the model or the explainer are propagated as they are.
pub fn compute<M, E, R>(
    model: &M,
    explainer: &E,
    inputs: ArrayView3<'_, f32>,
    args: Option<&[ArrayView3<'_, f32>]>,
    config: &AttributionConfig,
    rng: &mut R,
) -> Result<Array3<f32>, Error>
where
    M: Model + ?Sized,
    E: Explainer + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    let n = inputs.len_of(Axis(0));
    let args = args.unwrap_or(&[]);
    for (j, arg) in args.iter().enumerate() {
        if arg.len_of(Axis(0)) != n {
            return Err(Error::config(format!(
                "argument {} has {} rows for {} inputs",
                j,
                arg.len_of(Axis(0)),
                n
            )));
        }
    }

    let masked = inputs
        .lanes(Axis(1))
        .into_iter()
        .filter(|column| column.iter().all(|&v| v == 0.0))
        .count();
    if masked > 0 {
        log::warn!(
            "{} input positions are all-zero, their attributions will be zero",
            masked
        );
    }

    let profile = ProfileWrapper::new(model);
    let count = CountWrapper::new(model);
    let wrapper: &dyn Forward = match config.output {
        OutputSelector::Profile => &profile,
        OutputSelector::Count => &count,
    };
    log::debug!(
        "computing {} attributions against {} references ({} output)",
        n,
        config.n_shuffles,
        config.output
    );

    let mut attributions = Array3::zeros(inputs.dim());
    for i in 0..n {
        let x = inputs.slice(s![i..i + 1, .., ..]);
        let baselines = shuffle(inputs.index_axis(Axis(0), i), config.n_shuffles, rng);
        let args_ = args
            .iter()
            .map(|arg| arg.slice(s![i..i + 1, .., ..]))
            .collect::<Vec<_>>();

        let attr = explainer.attribute(wrapper, x, baselines.view(), 0, &args_)?;
        if attr.dim() != x.dim() {
            return Err(Error::Shape(format!(
                "explainer returned attributions of shape {:?} for an input of shape {:?}",
                attr.dim(),
                x.dim()
            )));
        }
        attributions
            .slice_mut(s![i..i + 1, .., ..])
            .assign(&(attr * &x));
    }

    Ok(attributions)
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::f64::consts::E;

    use approx::assert_relative_eq;
    use ndarray::stack;
    use ndarray::Array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::DEFAULT_N_SHUFFLES;
    use crate::encode::decode;
    use crate::encode::encode_str;

    const ACGT: &[char] = &['A', 'C', 'G', 'T'];

    /// A model with fixed outputs.
    struct Fixed {
        logits: Vec<f32>,
        counts: f32,
    }

    impl Model for Fixed {
        fn forward(
            &self,
            input: ArrayView3<'_, f32>,
            args: &[ArrayView3<'_, f32>],
        ) -> Result<ModelOutput, Error> {
            let batch = input.len_of(Axis(0));
            let w = self.logits.len();
            let shift = args.first().map(|a| a.sum()).unwrap_or(0.0);
            Ok(ModelOutput {
                profile: Array3::from_shape_fn((batch, 1, w), |(_, _, j)| self.logits[j]),
                counts: Array2::from_elem((batch, 1), self.counts + shift),
            })
        }
    }

    fn transitions(decoded: &[Option<usize>]) -> HashMap<(Option<usize>, Option<usize>), usize> {
        let mut counts = HashMap::new();
        for pair in decoded.windows(2) {
            *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
        }
        counts
    }

    /// An explainer returning the wrapped model output at every position.
    ///
    /// Every call checks that the baselines are dinucleotide shuffles of
    /// the input, and records whether any of them differs from the input.
    struct Constant {
        n_baselines: usize,
        calls: Cell<usize>,
        shuffled: Cell<bool>,
    }

    impl Constant {
        fn new(n_baselines: usize) -> Self {
            Self {
                n_baselines,
                calls: Cell::new(0),
                shuffled: Cell::new(false),
            }
        }
    }

    impl Explainer for Constant {
        fn attribute(
            &self,
            model: &dyn Forward,
            input: ArrayView3<'_, f32>,
            baselines: ArrayView3<'_, f32>,
            target: usize,
            args: &[ArrayView3<'_, f32>],
        ) -> Result<Array3<f32>, Error> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(target, 0);
            assert_eq!(input.len_of(Axis(0)), 1);
            assert_eq!(baselines.len_of(Axis(0)), self.n_baselines);

            let x = input.index_axis(Axis(0), 0);
            let expected = decode(x);
            for baseline in baselines.axis_iter(Axis(0)) {
                assert_eq!(baseline.dim(), x.dim());
                let decoded = decode(baseline);
                assert_eq!(decoded.first(), expected.first());
                assert_eq!(decoded.last(), expected.last());
                assert_eq!(transitions(&decoded), transitions(&expected));
                if baseline != x {
                    self.shuffled.set(true);
                }
            }

            let y = model.forward(input, args)?;
            Ok(Array3::from_elem(input.dim(), y[[0, target]]))
        }
    }

    /// An explainer returning attributions of the wrong shape.
    struct Broken;

    impl Explainer for Broken {
        fn attribute(
            &self,
            _model: &dyn Forward,
            _input: ArrayView3<'_, f32>,
            baselines: ArrayView3<'_, f32>,
            _target: usize,
            _args: &[ArrayView3<'_, f32>],
        ) -> Result<Array3<f32>, Error> {
            Ok(baselines.to_owned())
        }
    }

    fn inputs() -> Array3<f32> {
        let a = encode_str::<f32>("ACGTTGCAACGGTACCATGGATTACAGATTACA", 'N', Some(ACGT)).unwrap();
        let b = encode_str::<f32>("GGATNCCATTGACCAGTAGGCATCAAGCTTGCA", 'N', Some(ACGT)).unwrap();
        stack(Axis(0), &[a.view(), b.view()]).unwrap()
    }

    #[test]
    fn test_profile_wrapper() {
        let model = Fixed {
            logits: vec![0.0, 3f32.ln()],
            counts: 0.0,
        };
        let x = Array3::zeros((2, 4, 8));
        let y = ProfileWrapper::new(&model).forward(x.view(), &[]).unwrap();
        assert_eq!(y.dim(), (2, 1));
        assert_relative_eq!(y[[0, 0]], 0.75 * 3f32.ln(), epsilon = 1e-6);
        assert_relative_eq!(y[[1, 0]], 0.75 * 3f32.ln(), epsilon = 1e-6);
    }

    #[test]
    fn test_profile_wrapper_stable() {
        let model = Fixed {
            logits: vec![1000.0, 1000.0, -1000.0],
            counts: 0.0,
        };
        let x = Array3::zeros((1, 4, 8));
        let y = ProfileWrapper::new(&model).forward(x.view(), &[]).unwrap();
        assert!(y[[0, 0]].is_finite());
        assert!((y[[0, 0]] - 1000.0).abs() < 1e-3);

        let model = Fixed {
            logits: vec![5000.0, 4999.0],
            counts: 0.0,
        };
        let y = ProfileWrapper::new(&model).forward(x.view(), &[]).unwrap();
        // softmax is [e / (1 + e), 1 / (1 + e)]
        let expected = 5000.0 - 1.0 / (1.0 + E);
        assert!((y[[0, 0]] as f64 - expected).abs() < 5e-3);
    }

    #[test]
    fn test_count_wrapper() {
        let model = Fixed {
            logits: vec![0.0],
            counts: 4.5,
        };
        let x = Array3::zeros((3, 4, 8));
        let y = CountWrapper::new(&model).forward(x.view(), &[]).unwrap();
        assert_eq!(y, Array2::from_elem((3, 1), 4.5));
    }

    #[test]
    fn test_output_selector() {
        assert_eq!("profile".parse::<OutputSelector>(), Ok(OutputSelector::Profile));
        assert_eq!("count".parse::<OutputSelector>(), Ok(OutputSelector::Count));
        assert!("counts".parse::<OutputSelector>().is_err());
        assert_eq!(OutputSelector::Count.to_string(), "count");
    }

    #[test]
    fn test_compute_count() {
        let model = Fixed {
            logits: vec![1.0, 2.0],
            counts: 2.0,
        };
        let explainer = Constant::new(3);
        let config = AttributionConfig::new(OutputSelector::Count).with_n_shuffles(3);
        let x = inputs();
        let mut rng = StdRng::seed_from_u64(0);
        let attr = compute(&model, &explainer, x.view(), None, &config, &mut rng).unwrap();
        assert_eq!(explainer.calls.get(), 2);
        assert!(explainer.shuffled.get());
        assert_eq!(attr, &x * 2.0);
        // the N column stays empty
        assert_eq!(attr.slice(s![1, .., 4]).sum(), 0.0);
    }

    #[test]
    fn test_compute_profile() {
        let model = Fixed {
            logits: vec![1.0, 2.0],
            counts: 0.0,
        };
        let explainer = Constant::new(DEFAULT_N_SHUFFLES);
        let config = AttributionConfig::default();
        assert_eq!(config.output, OutputSelector::Profile);
        let x = inputs();
        let mut rng = StdRng::seed_from_u64(1);
        let attr = compute(&model, &explainer, x.view(), None, &config, &mut rng).unwrap();
        assert!(explainer.shuffled.get());

        let (e1, e2) = (1f32.exp(), 2f32.exp());
        let expected = (e1 + 2.0 * e2) / (e1 + e2);
        for (a, v) in attr.iter().zip(x.iter()) {
            assert_relative_eq!(*a, expected * v, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_compute_args() {
        let model = Fixed {
            logits: vec![1.0, 2.0],
            counts: 0.0,
        };
        let explainer = Constant::new(3);
        let config = AttributionConfig::new(OutputSelector::Count).with_n_shuffles(3);
        let x = inputs();
        let ctl = Array::from_shape_fn((2, 1, 8), |(i, _, _)| i as f32);
        let mut rng = StdRng::seed_from_u64(0);
        let attr = compute(
            &model,
            &explainer,
            x.view(),
            Some(&[ctl.view()][..]),
            &config,
            &mut rng,
        )
        .unwrap();
        // each example only sees its own control row
        assert_eq!(attr.slice(s![0, .., ..]).sum(), 0.0);
        assert_eq!(attr.slice(s![1, .., ..]).sum(), 32.0 * 8.0);
    }

    #[test]
    fn test_compute_errors() {
        let model = Fixed {
            logits: vec![1.0],
            counts: 0.0,
        };
        let explainer = Constant::new(3);
        let x = inputs();
        let mut rng = StdRng::seed_from_u64(0);

        let config = AttributionConfig::default().with_n_shuffles(0);
        let err = compute(&model, &explainer, x.view(), None, &config, &mut rng);
        assert!(matches!(err, Err(Error::Config(_))));

        let config = AttributionConfig::default().with_n_shuffles(3);
        let ctl = Array3::<f32>::zeros((3, 1, 8));
        let args = [ctl.view()];
        let err = compute(&model, &explainer, x.view(), Some(&args[..]), &config, &mut rng);
        assert!(matches!(err, Err(Error::Config(_))));
        assert_eq!(explainer.calls.get(), 0);

        let err = compute(&model, &Broken, x.view(), None, &config, &mut rng);
        assert!(matches!(err, Err(Error::Shape(_))));
    }
}
