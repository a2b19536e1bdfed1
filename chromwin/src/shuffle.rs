//! Dinucleotide-preserving shuffles of one-hot encoded sequences.
//!
//! A dinucleotide shuffle is a random sequence with exactly the same
//! multiset of adjacent symbol pairs as the original one. It is obtained as
//! a random Eulerian path through the graph whose nodes are the symbols of
//! the sequence and whose edges are its transitions.
//!
//! The path is drawn by permuting the outgoing edges of every node, except
//! for the edge taken after the last occurrence of the node, and walking the
//! edges greedily in that order starting from the first symbol. The fixed
//! edges form a tree rooted at the last symbol, so the greedy walk can never
//! get stuck before every edge has been used, and it always ends on the last
//! symbol of the original sequence.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use ndarray::s;
use ndarray::Array3;
use ndarray::ArrayView2;
use num_traits::One;
use num_traits::Zero;
use rand::seq::SliceRandom;
use rand::Rng;

use super::encode::decode;

// --- TransitionGraph ---------------------------------------------------------

/// The transition graph of a decoded sequence.
///
/// Every distinct decoded value is a node, including `None` for all-zero
/// columns: masked positions are shuffled along with the rest of the
/// sequence and keep their transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionGraph {
    /// The decoded value of every node.
    labels: Vec<Option<usize>>,
    /// The node of every sequence position.
    path: Vec<usize>,
    /// For each node, the positions immediately following an occurrence.
    successors: Vec<Vec<usize>>,
}

impl TransitionGraph {
    /// Build the transition graph of a sequence of decoded channels.
    pub fn new(decoded: &[Option<usize>]) -> Self {
        let index = decoded
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, label)| (label, i))
            .collect::<BTreeMap<Option<usize>, usize>>();
        let labels = index.keys().cloned().collect::<Vec<_>>();
        let path = decoded.iter().map(|x| index[x]).collect::<Vec<_>>();

        let mut successors = vec![Vec::new(); labels.len()];
        for (p, &node) in path.iter().enumerate().take(path.len().saturating_sub(1)) {
            successors[node].push(p + 1);
        }

        Self {
            labels,
            path,
            successors,
        }
    }

    /// Build the transition graph of a one-hot encoded sequence.
    pub fn from_one_hot<T>(ohe: ArrayView2<'_, T>) -> Self
    where
        T: PartialOrd + Zero,
    {
        Self::new(&decode(ohe))
    }

    /// The number of positions in the sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Check whether the sequence is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// The decoded value of every node, sorted.
    #[inline]
    pub fn nodes(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// The successor slots of a node, in sequence order.
    #[inline]
    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    /// Check whether every shuffle of the sequence is the sequence itself.
    ///
    /// This is the case for sequences with less than two positions, or with
    /// a single distinct symbol.
    pub fn is_degenerate(&self) -> bool {
        self.path.len() < 2 || self.labels.len() < 2
    }

    /// Draw the successor order of a single shuffle.
    ///
    /// The slots are copied from the graph before being permuted, so that
    /// every draw is independent from the previous ones.
    fn permute<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec<usize>> {
        let mut slots = self.successors.clone();
        for s in slots.iter_mut() {
            if let Some((_last, rest)) = s.split_last_mut() {
                rest.shuffle(rng);
            }
        }
        slots
    }

    /// Draw a random Eulerian walk, returned as decoded channels.
    pub fn walk<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Option<usize>> {
        let mut walk = Vec::with_capacity(self.path.len());
        let mut current = match self.path.first() {
            Some(&node) => node,
            None => return walk,
        };
        walk.push(self.labels[current]);

        let slots = self.permute(rng);
        let mut counters = vec![0; self.labels.len()];
        for _ in 1..self.path.len() {
            // the fixed last slots guarantee an unused edge is always left
            let next = slots[current][counters[current]];
            counters[current] += 1;
            current = self.path[next];
            walk.push(self.labels[current]);
        }

        walk
    }
}

// --- shuffle -----------------------------------------------------------------

/// Generate dinucleotide shuffles of a one-hot encoded sequence.
///
/// Returns a tensor of shape `(n_shuffles, alphabet_size, length)`. Every
/// shuffle starts and ends with the same symbols as the input, and has the
/// same transition counts. Degenerate inputs (see
/// [`TransitionGraph::is_degenerate`]) yield `n_shuffles` copies of the input.
///
/// # Example
/// ```
/// # use rand::SeedableRng;
/// # use chromwin::encode::encode_str;
/// # use chromwin::shuffle::shuffle;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let seq = encode_str::<f32>("ACGTTGCA", 'N', Some(&['A', 'C', 'G', 'T'][..])).unwrap();
/// let shuffled = shuffle(seq.view(), 10, &mut rng);
/// assert_eq!(shuffled.dim(), (10, 4, 8));
/// ```
pub fn shuffle<T, R>(ohe: ArrayView2<'_, T>, n_shuffles: usize, rng: &mut R) -> Array3<T>
where
    T: Clone + Zero + One + PartialOrd,
    R: Rng + ?Sized,
{
    let (k, length) = ohe.dim();
    let mut shuffled = Array3::zeros((n_shuffles, k, length));
    let graph = TransitionGraph::from_one_hot(ohe);
    log::trace!(
        "shuffling {} positions over {} nodes ({} times)",
        length,
        graph.nodes().len(),
        n_shuffles
    );

    if graph.is_degenerate() {
        for i in 0..n_shuffles {
            shuffled.slice_mut(s![i, .., ..]).assign(&ohe);
        }
        return shuffled;
    }

    for i in 0..n_shuffles {
        for (j, label) in graph.walk(rng).into_iter().enumerate() {
            if let Some(c) = label {
                shuffled[[i, c, j]] = T::one();
            }
        }
    }

    shuffled
}
