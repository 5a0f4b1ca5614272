//! Dictionary store for schema identifier canonicalization.
//!
//! A [`Lexicon`] bundles the abbreviation, phrase and token synonym maps used to rewrite
//! normalized identifiers, plus the context groups used to enrich embedding prompts.
//! Lexicons are immutable once loaded and are shared behind an `Arc` by the engine.
//!
//! # Example
//!
//! ```ignore
//! use dbgrade_lexicon::{Lexicon, normalize};
//!
//! let lexicon = Lexicon::embedded()?;
//! assert_eq!(lexicon.rewrite(&normalize("CT_MuaHang")), "chi tiet mua hang");
//! ```

#![deny(unsafe_code)]

pub mod embedded;
pub mod error;
pub mod hash;
pub mod lexicon;
pub mod normalize;

pub use error::{LexiconError, Result};
pub use hash::sha256_hex;
pub use lexicon::{ContextGroup, Lexicon, PhraseRule};
pub use normalize::normalize;
