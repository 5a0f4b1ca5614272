//! Lexicon data compiled into the binary.

/// Default Vietnamese accounting lexicon.
pub const DEFAULT_LEXICON: &str = include_str!("../data/lexicon.toml");
