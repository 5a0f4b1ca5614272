//! Immutable abbreviation and synonym dictionaries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedded::DEFAULT_LEXICON;
use crate::error::{LexiconError, Result};
use crate::hash::sha256_hex;
use crate::normalize::normalize;

/// A multi-token substitution, stored as normalized token lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseRule {
    pub pattern: Vec<String>,
    pub replacement: Vec<String>,
}

/// A term and the phrases considered equivalent to it in embedding prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextGroup {
    pub term: String,
    #[serde(default)]
    pub equivalents: Vec<String>,
}

impl ContextGroup {
    /// Renders the group as an equivalence hint, `term = a = b`.
    pub fn hint(&self) -> String {
        let mut hint = self.term.clone();
        for equivalent in &self.equivalents {
            hint.push_str(" = ");
            hint.push_str(equivalent);
        }
        hint
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LexiconFile {
    #[serde(default)]
    abbreviations: BTreeMap<String, String>,
    #[serde(default)]
    phrases: BTreeMap<String, String>,
    #[serde(default)]
    tokens: BTreeMap<String, String>,
    #[serde(default)]
    context: Vec<ContextGroup>,
}

/// Dictionaries applied to normalized identifiers.
///
/// All keys and values are stored in normalized form. Replacement values never contain
/// a key of any section, so a rewrite pass reaches a fixed point quickly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    abbreviations: BTreeMap<String, String>,
    phrases: Vec<PhraseRule>,
    tokens: BTreeMap<String, String>,
    context: Vec<ContextGroup>,
}

impl Lexicon {
    /// A lexicon with no entries; rewriting is the identity.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the lexicon compiled into the crate.
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_LEXICON, "<embedded>")
    }

    /// Reads and parses a lexicon file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LexiconError::io(path, e))?;
        let lexicon = Self::parse(&text, &path.display().to_string())?;
        debug!(path = %path.display(), entries = lexicon.len(), "loaded lexicon");
        Ok(lexicon)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::parse(text, "<string>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let file: LexiconFile = toml::from_str(text).map_err(|source| LexiconError::Toml {
            origin: origin.to_string(),
            source,
        })?;
        Self::from_file(file)
    }

    fn from_file(file: LexiconFile) -> Result<Self> {
        let abbreviations = normalize_section("abbreviations", file.abbreviations)?;
        let tokens = normalize_section("tokens", file.tokens)?;
        for (section, entries) in [("abbreviations", &abbreviations), ("tokens", &tokens)] {
            if let Some(key) = entries.keys().find(|key| key.contains(' ')) {
                return Err(LexiconError::MultiWordKey {
                    section,
                    key: key.clone(),
                });
            }
        }
        let phrases = normalize_section("phrases", file.phrases)?;

        let mut rules: Vec<PhraseRule> = phrases
            .into_iter()
            .map(|(pattern, replacement)| PhraseRule {
                pattern: split_tokens(&pattern),
                replacement: split_tokens(&replacement),
            })
            .collect();
        // Longer patterns first, then lexicographic, so application order is stable.
        rules.sort_by(|a, b| {
            b.pattern
                .len()
                .cmp(&a.pattern.len())
                .then_with(|| a.pattern.cmp(&b.pattern))
        });

        let mut context = Vec::with_capacity(file.context.len());
        for group in file.context {
            let term = normalize(&group.term);
            if term.is_empty() {
                return Err(LexiconError::EmptyEntry {
                    section: "context",
                    key: group.term,
                });
            }
            let equivalents = group
                .equivalents
                .iter()
                .map(|value| normalize(value))
                .filter(|value| !value.is_empty())
                .collect();
            context.push(ContextGroup { term, equivalents });
        }

        let lexicon = Self {
            abbreviations,
            phrases: rules,
            tokens,
            context,
        };
        lexicon.check_stable()?;
        Ok(lexicon)
    }

    /// Rejects replacement values that contain a key, which would make rewriting unstable.
    fn check_stable(&self) -> Result<()> {
        let single_keys: BTreeSet<&str> = self
            .abbreviations
            .iter()
            .chain(self.tokens.iter())
            .filter(|(key, value)| key != value)
            .map(|(key, _)| key.as_str())
            .collect();
        let values = self
            .abbreviations
            .iter()
            .map(|(key, value)| ("abbreviations", key.clone(), split_tokens(value)))
            .chain(
                self.tokens
                    .iter()
                    .map(|(key, value)| ("tokens", key.clone(), split_tokens(value))),
            )
            .chain(
                self.phrases
                    .iter()
                    .map(|rule| ("phrases", rule.pattern.join(" "), rule.replacement.clone())),
            );
        for (section, key, value) in values {
            if let Some(token) = value.iter().find(|t| single_keys.contains(t.as_str())) {
                return Err(LexiconError::UnstableEntry {
                    section,
                    key,
                    value: value.join(" "),
                    conflict: token.clone(),
                });
            }
            for rule in &self.phrases {
                if rule.pattern != rule.replacement && contains_run(&value, &rule.pattern) {
                    return Err(LexiconError::UnstableEntry {
                        section,
                        key,
                        value: value.join(" "),
                        conflict: rule.pattern.join(" "),
                    });
                }
            }
        }
        Ok(())
    }

    /// Applies one substitution pass to already-normalized text.
    ///
    /// Abbreviations expand per token, phrase rules rewrite token runs, then token
    /// synonyms apply per token.
    pub fn rewrite(&self, normalized: &str) -> String {
        if !self.has_substitutions() {
            return normalized.to_string();
        }
        let mut tokens: Vec<String> = normalized
            .split_whitespace()
            .flat_map(|token| match self.abbreviations.get(token) {
                Some(expansion) => split_tokens(expansion),
                None => vec![token.to_string()],
            })
            .collect();

        for rule in &self.phrases {
            tokens = apply_phrase(tokens, rule);
        }

        tokens
            .iter()
            .map(|token| {
                self.tokens
                    .get(token.as_str())
                    .map_or(token.as_str(), String::as_str)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn abbreviation(&self, token: &str) -> Option<&str> {
        self.abbreviations.get(token).map(String::as_str)
    }

    pub fn token_synonym(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    pub fn phrase_rules(&self) -> &[PhraseRule] {
        &self.phrases
    }

    pub fn context_groups(&self) -> &[ContextGroup] {
        &self.context
    }

    /// Context groups whose term or an equivalent occurs in `normalized` on word boundaries.
    pub fn context_for<'a>(&'a self, normalized: &str) -> impl Iterator<Item = &'a ContextGroup> {
        let padded = format!(" {normalized} ");
        self.context.iter().filter(move |group| {
            std::iter::once(&group.term)
                .chain(group.equivalents.iter())
                .any(|phrase| padded.contains(&format!(" {phrase} ")))
        })
    }

    /// Total number of entries across all sections.
    pub fn len(&self) -> usize {
        self.abbreviations.len() + self.phrases.len() + self.tokens.len() + self.context.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when any abbreviation, phrase or token entry exists.
    pub fn has_substitutions(&self) -> bool {
        !(self.abbreviations.is_empty() && self.phrases.is_empty() && self.tokens.is_empty())
    }

    /// Content digest identifying this dictionary in reports.
    pub fn fingerprint(&self) -> String {
        let mut canonical = String::new();
        for (key, value) in &self.abbreviations {
            let _ = writeln!(canonical, "a\t{key}\t{value}");
        }
        for rule in &self.phrases {
            let _ = writeln!(
                canonical,
                "p\t{}\t{}",
                rule.pattern.join(" "),
                rule.replacement.join(" ")
            );
        }
        for (key, value) in &self.tokens {
            let _ = writeln!(canonical, "t\t{key}\t{value}");
        }
        for group in &self.context {
            let _ = writeln!(canonical, "c\t{}", group.hint());
        }
        sha256_hex(canonical.as_bytes())
    }
}

fn normalize_section(
    section: &'static str,
    entries: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    let mut normalized = BTreeMap::new();
    for (key, value) in entries {
        let norm_key = normalize(&key);
        let norm_value = normalize(&value);
        if norm_key.is_empty() || norm_value.is_empty() {
            return Err(LexiconError::EmptyEntry { section, key });
        }
        normalized.insert(norm_key, norm_value);
    }
    Ok(normalized)
}

fn split_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn contains_run(tokens: &[String], pattern: &[String]) -> bool {
    !pattern.is_empty() && tokens.windows(pattern.len()).any(|window| window == pattern)
}

/// Replaces every non-overlapping occurrence of the rule's pattern, scanning left to right.
fn apply_phrase(tokens: Vec<String>, rule: &PhraseRule) -> Vec<String> {
    let width = rule.pattern.len();
    if width == 0 || tokens.len() < width {
        return tokens;
    }
    let mut out = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        if index + width <= tokens.len() && tokens[index..index + width] == rule.pattern[..] {
            out.extend(rule.replacement.iter().cloned());
            index += width;
        } else {
            out.push(tokens[index].clone());
            index += 1;
        }
    }
    out
}
