//! Canonical forms of schema identifiers.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use dbgrade_lexicon::Lexicon;
pub use dbgrade_lexicon::normalize::normalize;

/// Upper bound on rewrite passes; lexicon values never contain keys, so two or three suffice.
const MAX_REWRITE_PASSES: usize = 8;

/// Canonicalizes identifiers against an injected lexicon.
///
/// Results are memoized in a bounded LRU owned by this instance, so separate normalizers
/// with different lexicons never share state.
pub struct Normalizer {
    lexicon: Arc<Lexicon>,
    memo: Mutex<LruCache<String, String>>,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("lexicon_entries", &self.lexicon.len())
            .finish_non_exhaustive()
    }
}

impl Normalizer {
    pub fn new(lexicon: Arc<Lexicon>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            lexicon,
            memo: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Normalized text with abbreviations, phrases and token synonyms substituted.
    ///
    /// Substitution repeats until the text stops changing, which makes the result a
    /// fixed point: `canonical(canonical(x)) == canonical(x)`.
    pub fn canonical(&self, text: &str) -> String {
        if let Ok(mut memo) = self.memo.lock()
            && let Some(hit) = memo.get(text)
        {
            return hit.clone();
        }

        let mut current = normalize(text);
        for _ in 0..MAX_REWRITE_PASSES {
            let next = normalize(&self.lexicon.rewrite(&current));
            if next == current {
                break;
            }
            current = next;
        }

        if let Ok(mut memo) = self.memo.lock() {
            memo.put(text.to_string(), current.clone());
        }
        current
    }

    /// Canonical form with spaces removed.
    pub fn compact(&self, text: &str) -> String {
        self.canonical(text).replace(' ', "")
    }

    /// The exact-match rule used by every matcher.
    ///
    /// Two names are equivalent when they are equal ignoring ASCII case, or when their
    /// canonical forms are equal with spaces removed. Names that canonicalize to nothing
    /// only match themselves.
    pub fn names_equivalent(&self, a: &str, b: &str) -> bool {
        let (a, b) = (a.trim(), b.trim());
        if a.eq_ignore_ascii_case(b) {
            return true;
        }
        let compact_a = self.compact(a);
        !compact_a.is_empty() && compact_a == self.compact(b)
    }

    /// Number of memoized canonical forms.
    pub fn memo_len(&self) -> usize {
        self.memo.lock().map(|memo| memo.len()).unwrap_or(0)
    }
}
