//! Supplementary lexicon: flexible JSON loading, mtime-keyed caching, and
//! greedy longest-first non-overlapping term spotting.
//!
//! The dictionary file is user-maintained, so every malformed input path
//! degrades to an empty dictionary instead of failing the pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DICTIONARY_FILE: &str = "dictionary.json";

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("dictionary at {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unsupported dictionary shape: expected an array or object")]
    UnsupportedShape,
}

/// Which lexicon a term came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    /// Proper names: `name` / `alias` entries.
    Character,
    /// Terminology: `term` / `variants` entries.
    Glossary,
}

/// The two flattened term lists, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSets {
    pub character_terms: Vec<String>,
    pub glossary_terms: Vec<String>,
}

impl TermSets {
    pub fn is_empty(&self) -> bool {
        self.character_terms.is_empty() && self.glossary_terms.is_empty()
    }
}

/// One accepted occurrence of a dictionary term in a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMatch {
    /// Codepoint offset of the first matched character.
    pub start: usize,
    /// Codepoint offset one past the last matched character.
    pub end: usize,
    pub kind: TermKind,
    pub term: String,
}

/// Flatten any of the accepted dictionary shapes into term sets.
///
/// Accepted shapes:
/// - flat string array (all character terms);
/// - array of objects with `name`/`alias` (character) or `term`/`variants`
///   (glossary), where the alias field may be a string or string array;
/// - an object map whose values carry the same nested fields.
pub fn parse_source(value: &Value) -> Result<TermSets, DictionaryError> {
    let mut sets = TermSets::default();
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_entry(item, &mut sets)?;
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                flatten_entry(item, &mut sets)?;
            }
        }
        _ => return Err(DictionaryError::UnsupportedShape),
    }
    sets.character_terms.retain(|t| !t.is_empty());
    sets.glossary_terms.retain(|t| !t.is_empty());
    Ok(sets)
}

fn flatten_entry(item: &Value, sets: &mut TermSets) -> Result<(), DictionaryError> {
    match item {
        Value::String(s) => sets.character_terms.push(s.clone()),
        Value::Object(obj) => {
            if let Some(name) = obj.get("name").and_then(Value::as_str) {
                sets.character_terms.push(name.to_owned());
                push_string_or_array(obj.get("alias"), &mut sets.character_terms);
            }
            if let Some(term) = obj.get("term").and_then(Value::as_str) {
                sets.glossary_terms.push(term.to_owned());
                push_string_or_array(obj.get("variants"), &mut sets.glossary_terms);
            }
            // Objects with neither field contribute nothing; tolerated so a
            // partially edited dictionary still loads.
        }
        _ => return Err(DictionaryError::UnsupportedShape),
    }
    Ok(())
}

fn push_string_or_array(value: Option<&Value>, out: &mut Vec<String>) {
    match value {
        Some(Value::String(s)) => out.push(s.clone()),
        Some(Value::Array(items)) => {
            out.extend(items.iter().filter_map(Value::as_str).map(str::to_owned));
        }
        _ => {}
    }
}

/// Greedy longest-first non-overlapping keyword spotting.
///
/// Needles are tried in descending codepoint length (character kind before
/// glossary on ties, then declaration order); each needle scans left to
/// right and an occurrence is accepted only if none of its codepoints is
/// already consumed. Results come back sorted by start offset.
pub fn match_terms(line: &str, terms: &TermSets) -> Vec<TermMatch> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() || terms.is_empty() {
        return Vec::new();
    }

    struct Needle<'a> {
        text: Vec<char>,
        raw: &'a str,
        kind: TermKind,
        decl: usize,
    }

    let mut needles: Vec<Needle> = Vec::new();
    for (decl, t) in terms.character_terms.iter().enumerate() {
        needles.push(Needle {
            text: t.chars().collect(),
            raw: t,
            kind: TermKind::Character,
            decl,
        });
    }
    for (decl, t) in terms.glossary_terms.iter().enumerate() {
        needles.push(Needle {
            text: t.chars().collect(),
            raw: t,
            kind: TermKind::Glossary,
            decl,
        });
    }
    needles.retain(|n| !n.text.is_empty());
    needles.sort_by(|a, b| {
        b.text
            .len()
            .cmp(&a.text.len())
            .then_with(|| a.kind.cmp_order().cmp(&b.kind.cmp_order()))
            .then_with(|| a.decl.cmp(&b.decl))
    });

    let mut consumed = vec![false; chars.len()];
    let mut matches = Vec::new();

    for needle in &needles {
        let n = needle.text.len();
        if n > chars.len() {
            continue;
        }
        let mut i = 0;
        while i + n <= chars.len() {
            if chars[i..i + n] == needle.text[..] {
                if consumed[i..i + n].iter().any(|&c| c) {
                    i += 1;
                    continue;
                }
                consumed[i..i + n].iter_mut().for_each(|c| *c = true);
                matches.push(TermMatch {
                    start: i,
                    end: i + n,
                    kind: needle.kind,
                    term: needle.raw.to_owned(),
                });
                i += n;
            } else {
                i += 1;
            }
        }
    }

    matches.sort_by_key(|m| m.start);
    matches
}

impl TermKind {
    fn cmp_order(self) -> u8 {
        match self {
            TermKind::Character => 0,
            TermKind::Glossary => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheState {
    mtime: Option<SystemTime>,
    exists: bool,
}

/// Lexicon store bound to one directory, cached per file mtime.
///
/// Reloads when the mtime changes or the file appears/disappears; a missing
/// or malformed file yields an empty dictionary.
pub struct DictionaryStore {
    path: PathBuf,
    state: Option<CacheState>,
    terms: TermSets,
}

impl DictionaryStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(DICTIONARY_FILE),
            state: None,
            terms: TermSets::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current term sets, reloading from disk if the file changed.
    pub fn terms(&mut self) -> &TermSets {
        let state = self.stat();
        if self.state.as_ref() != Some(&state) {
            self.terms = if state.exists {
                self.read_terms().unwrap_or_default()
            } else {
                TermSets::default()
            };
            self.state = Some(state);
        }
        &self.terms
    }

    /// Like [`terms`](Self::terms) but surfaces the load error instead of
    /// absorbing it, for hosts that want to report a broken dictionary.
    pub fn try_reload(&mut self) -> Result<&TermSets, DictionaryError> {
        let state = self.stat();
        if self.state.as_ref() != Some(&state) {
            self.terms = if state.exists {
                self.read_terms()?
            } else {
                TermSets::default()
            };
            self.state = Some(state);
        }
        Ok(&self.terms)
    }

    fn stat(&self) -> CacheState {
        match fs::metadata(&self.path) {
            Ok(meta) => CacheState {
                mtime: meta.modified().ok(),
                exists: true,
            },
            Err(_) => CacheState {
                mtime: None,
                exists: false,
            },
        }
    }

    fn read_terms(&self) -> Result<TermSets, DictionaryError> {
        let content = fs::read_to_string(&self.path).map_err(|source| DictionaryError::Read {
            path: self.path.clone(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|source| DictionaryError::Json {
                path: self.path.clone(),
                source,
            })?;
        parse_source(&value)
    }
}
