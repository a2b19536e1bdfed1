//! One-hot encoding of symbol sequences.
//!
//! A one-hot matrix has shape `(alphabet_size, length)`: every column holds
//! at most a single one, and columns of the ignore symbol are all-zero.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Debug;

use ndarray::Array2;
use ndarray::ArrayView2;
use num_traits::One;
use num_traits::Zero;

use super::abc::Alphabet;
use super::abc::Dna;
use super::abc::Nucleotide;
use super::abc::Symbol;
use super::err::UnknownSymbol;

// --- SymbolSet ---------------------------------------------------------------

/// An ordered set of symbols with a reserved ignore symbol.
///
/// Unlike [`Alphabet`](crate::abc::Alphabet), the symbols of a `SymbolSet`
/// are only known at runtime, which allows encoding arbitrary sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolSet<S: Ord + Clone> {
    symbols: Vec<S>,
    ignore: S,
    lookup: BTreeMap<S, usize>,
}

impl<S: Ord + Clone> SymbolSet<S> {
    /// Create a new symbol set from an explicit list of symbols.
    ///
    /// The ignore symbol is removed from the list if present, and only the
    /// first occurrence of duplicate symbols is kept.
    pub fn new<I>(symbols: I, ignore: S) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let mut lookup = BTreeMap::new();
        let mut ordered = Vec::new();
        for s in symbols {
            if s != ignore && !lookup.contains_key(&s) {
                lookup.insert(s.clone(), ordered.len());
                ordered.push(s);
            }
        }
        Self {
            symbols: ordered,
            ignore,
            lookup,
        }
    }

    /// Infer a symbol set from the distinct symbols of a sequence, sorted.
    ///
    /// # Note
    /// This requires a complete pass over the sequence, which may be
    /// expensive for genome-sized inputs; prefer [`SymbolSet::new`] when
    /// the alphabet is known in advance.
    pub fn infer(sequence: &[S], ignore: S) -> Self {
        let distinct = sequence.iter().cloned().collect::<BTreeSet<S>>();
        Self::new(distinct, ignore)
    }

    /// The number of channels of the encoding.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check whether the set has no channel symbol.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The channel symbols, in channel order.
    #[inline]
    pub fn symbols(&self) -> &[S] {
        &self.symbols
    }

    /// The symbol encoded as an all-zero column.
    #[inline]
    pub fn ignore(&self) -> &S {
        &self.ignore
    }

    /// Get the channel of the given symbol, if any.
    #[inline]
    pub fn channel(&self, symbol: &S) -> Option<usize> {
        self.lookup.get(symbol).cloned()
    }
}

impl<S: Ord + Clone + Debug> SymbolSet<S> {
    /// Encode a sequence into a one-hot matrix.
    pub fn encode<T>(&self, sequence: &[S]) -> Result<Array2<T>, UnknownSymbol>
    where
        T: Clone + Zero + One,
    {
        let mut ohe = Array2::zeros((self.len(), sequence.len()));
        for (i, s) in sequence.iter().enumerate() {
            if *s == self.ignore {
                continue;
            }
            match self.channel(s) {
                Some(k) => ohe[[k, i]] = T::one(),
                None => {
                    return Err(UnknownSymbol {
                        symbol: format!("{:?}", s),
                        position: i,
                    })
                }
            }
        }
        Ok(ohe)
    }
}

// --- Functions ---------------------------------------------------------------

/// Encode a sequence of symbols into a one-hot matrix.
///
/// When `alphabet` is `None`, the alphabet is inferred from the sequence
/// with [`SymbolSet::infer`], at the cost of an additional pass over the
/// data.
///
/// # Errors
/// Returns [`UnknownSymbol`] when an explicit alphabet is given and the
/// sequence contains a symbol absent from it that is not `ignore`.
pub fn encode<T, S>(
    sequence: &[S],
    ignore: &S,
    alphabet: Option<&[S]>,
) -> Result<Array2<T>, UnknownSymbol>
where
    T: Clone + Zero + One,
    S: Ord + Clone + Debug,
{
    let set = match alphabet {
        Some(symbols) => SymbolSet::new(symbols.iter().cloned(), ignore.clone()),
        None => SymbolSet::infer(sequence, ignore.clone()),
    };
    set.encode(sequence)
}

/// Encode a string into a one-hot matrix, one symbol per character.
///
/// # Example
/// ```
/// # use chromwin::encode::encode_str;
/// let ohe = encode_str::<u8>("ACGT", 'N', Some(&['A', 'C', 'G', 'T'][..])).unwrap();
/// assert_eq!(ohe.sum(), 4);
/// assert_eq!(ohe[[2, 2]], 1);
/// ```
pub fn encode_str<T>(
    sequence: &str,
    ignore: char,
    alphabet: Option<&[char]>,
) -> Result<Array2<T>, UnknownSymbol>
where
    T: Clone + Zero + One,
{
    let chars = sequence.chars().collect::<Vec<char>>();
    encode(&chars, &ignore, alphabet)
}

/// Encode raw genome text with the [`Dna`] alphabet.
///
/// Lowercase bases are accepted, and any character other than `A`, `C`,
/// `G` or `T` becomes an ignore column.
pub fn encode_dna<T>(text: &[u8]) -> Array2<T>
where
    T: Clone + Zero + One,
{
    let mut ohe = Array2::zeros((<Dna as Alphabet>::symbols().len(), text.len()));
    for (i, &c) in text.iter().enumerate() {
        let n = Nucleotide::from_ascii(c.to_ascii_uppercase())
            .unwrap_or_else(Dna::ignore_symbol);
        if let Some(k) = Dna::channel(n) {
            ohe[[k, i]] = T::one();
        }
    }
    ohe
}

/// Decode a one-hot matrix into channel indices.
///
/// Each column decodes to the channel of its largest entry, the first one
/// on ties. All-zero columns decode to `None`.
pub fn decode<T>(ohe: ArrayView2<'_, T>) -> Vec<Option<usize>>
where
    T: PartialOrd + Zero,
{
    ohe.columns()
        .into_iter()
        .map(|column| {
            let mut best: Option<(usize, &T)> = None;
            for (k, x) in column.iter().enumerate() {
                if *x > T::zero() && best.map(|(_, b)| x > b).unwrap_or(true) {
                    best = Some((k, x));
                }
            }
            best.map(|(k, _)| k)
        })
        .collect()
}

/// Build a one-hot matrix with `k` channels from decoded channel indices.
///
/// # Panics
/// Panics if any index is not lower than `k`.
pub fn from_indices<T>(indices: &[Option<usize>], k: usize) -> Array2<T>
where
    T: Clone + Zero + One,
{
    let mut ohe = Array2::zeros((k, indices.len()));
    for (i, index) in indices.iter().enumerate() {
        if let Some(c) = index {
            ohe[[*c, i]] = T::one();
        }
    }
    ohe
}
