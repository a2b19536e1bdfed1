#![doc = include_str!("../README.md")]

extern crate generic_array;
extern crate ndarray;
extern crate rand;
extern crate typenum;

pub mod abc;
pub mod attr;
pub mod config;
pub mod encode;
pub mod err;
pub mod extract;
pub mod region;
pub mod sampler;
pub mod shuffle;
pub mod source;

pub use abc::Alphabet;
pub use abc::ComplementableAlphabet;
pub use abc::ComplementableSymbol;
pub use abc::Dna;
pub use abc::Nucleotide;
pub use abc::Symbol;
pub use attr::Explainer;
pub use attr::Forward;
pub use attr::Model;
pub use attr::ModelOutput;
pub use attr::OutputSelector;
pub use config::AttributionConfig;
pub use config::ExtractConfig;
pub use config::SamplerConfig;
pub use config::WindowConfig;
pub use encode::SymbolSet;
pub use err::Error;
pub use err::InvalidConfig;
pub use err::SourceError;
pub use err::UnknownSymbol;
pub use extract::WindowedExamples;
pub use region::Peak;
pub use region::Window;
pub use sampler::Example;
pub use sampler::Sampler;
pub use shuffle::TransitionGraph;
pub use source::Genome;
pub use source::GenomeReader;
pub use source::Track;
pub use source::TrackReader;
