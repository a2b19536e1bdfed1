//! Typed biological alphabets with compile-time sizes.
//!
//! The channel order of an alphabet is the order of [`Alphabet::symbols`],
//! and is the row order of every one-hot matrix built with it. The ignore
//! symbol of an alphabet owns no channel.

use std::fmt::Debug;

use generic_array::ArrayLength;
use generic_array::GenericArray;
use typenum::consts::U4;
use typenum::marker_traits::NonZero;
use typenum::marker_traits::Unsigned;

// --- Symbol ------------------------------------------------------------------

/// A symbol from a biological alphabet.
pub trait Symbol: Default + Sized + Copy + Eq {
    /// View this symbol as a zero-based index.
    fn as_index(&self) -> usize;
    /// Parse an ASCII character into a symbol.
    fn from_ascii(c: u8) -> Option<Self>;
}

/// A symbol that can be complemented.
pub trait ComplementableSymbol: Symbol {
    /// Get the complement of this symbol.
    fn complement(&self) -> Self;
}

// --- Alphabet ----------------------------------------------------------------

/// A biological alphabet with associated metadata.
pub trait Alphabet: Debug + Copy + Default + 'static {
    type Symbol: Symbol + Debug;
    /// The number of channels, i.e. of symbols other than the ignore symbol.
    type K: Unsigned + NonZero + ArrayLength + Debug;

    /// Get the symbol encoded as an all-zero column.
    fn ignore_symbol() -> Self::Symbol {
        Default::default()
    }

    /// Get the channel symbols of this alphabet, in channel order.
    fn symbols() -> &'static [Self::Symbol];

    /// Get a string with all channel symbols from this alphabet.
    fn as_str() -> &'static str;

    /// Get the channel of a symbol, or `None` for the ignore symbol.
    fn channel(s: Self::Symbol) -> Option<usize> {
        Self::symbols().iter().position(|&x| x == s)
    }
}

// --- ComplementableAlphabet --------------------------------------------------

/// An alphabet that defines the complement operation.
pub trait ComplementableAlphabet: Alphabet {
    /// Get the complement of this symbol.
    fn complement(s: Self::Symbol) -> Self::Symbol;

    /// Get the channel of the complement of every channel.
    fn complement_table() -> GenericArray<usize, Self::K> {
        Self::symbols()
            .iter()
            .map(|&s| Self::channel(Self::complement(s)).unwrap_or(usize::MAX))
            .collect()
    }

    /// Check that reversing the channel axis complements every symbol.
    ///
    /// Reverse-complement augmentation flips one-hot tensors along both
    /// axes, which is only a complement when this holds.
    ///
    /// # Example
    /// ```
    /// # use chromwin::abc::*;
    /// assert!(Dna::reversal_is_complement());
    /// ```
    fn reversal_is_complement() -> bool {
        let k = Self::K::USIZE;
        Self::complement_table()
            .iter()
            .enumerate()
            .all(|(i, &c)| c == k - 1 - i)
    }
}

impl<A: Alphabet> ComplementableAlphabet for A
where
    <A as Alphabet>::Symbol: ComplementableSymbol,
{
    fn complement(s: Self::Symbol) -> Self::Symbol {
        s.complement()
    }
}

// --- DNA ---------------------------------------------------------------------

/// The standard DNA alphabet composed of 4 deoxyribonucleotides and a wildcard.
///
/// Channels are ordered `A, C, G, T`, so that reversing them yields the
/// complementary strand. The `N` wildcard is the ignore symbol.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dna;

impl Alphabet for Dna {
    type Symbol = Nucleotide;
    type K = U4;

    fn symbols() -> &'static [Nucleotide] {
        &[Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::T]
    }

    fn as_str() -> &'static str {
        "ACGT"
    }

    fn channel(s: Nucleotide) -> Option<usize> {
        match s {
            Nucleotide::N => None,
            other => Some(other.as_index()),
        }
    }
}

/// A deoxyribonucleotide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Nucleotide {
    /// Adenine.
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Thymine.
    T = 3,
    /// Unknown base.
    #[default]
    N = 4,
}

impl Symbol for Nucleotide {
    fn as_index(&self) -> usize {
        *self as usize
    }

    fn from_ascii(c: u8) -> Option<Self> {
        match c {
            b'A' => Some(Nucleotide::A),
            b'C' => Some(Nucleotide::C),
            b'G' => Some(Nucleotide::G),
            b'T' => Some(Nucleotide::T),
            b'N' => Some(Nucleotide::N),
            _ => None,
        }
    }
}

impl ComplementableSymbol for Nucleotide {
    fn complement(&self) -> Self {
        match *self {
            Nucleotide::A => Nucleotide::T,
            Nucleotide::T => Nucleotide::A,
            Nucleotide::G => Nucleotide::C,
            Nucleotide::C => Nucleotide::G,
            Nucleotide::N => Nucleotide::N,
        }
    }
}
