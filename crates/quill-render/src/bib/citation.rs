//! First-citation ordering and citation keys.

use std::collections::{HashMap, HashSet};

use super::record::BibRecord;

/// How an in-text citation is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CitationMode {
    /// `[1, 3]`
    Id,
    /// `Weise et al. [1]`
    AuthorsAndId,
}

/// A cited record with its key and 1-based position in the reference list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BibReference {
    pub record: BibRecord,
    pub key: String,
    pub index: usize,
}

/// Records cited so far, in first-citation order.
#[derive(Debug, Default)]
pub(crate) struct Bibliography {
    entries: Vec<BibReference>,
    by_record: HashMap<BibRecord, usize>,
    keys: HashSet<String>,
}

impl Bibliography {
    /// Register a citation of `record`; returns its entry.
    pub(crate) fn cite(&mut self, record: &BibRecord) -> &BibReference {
        let position = match self.by_record.get(record) {
            Some(&position) => position,
            None => {
                let key = self.unique_key(record);
                let position = self.entries.len();
                self.entries.push(BibReference {
                    record: record.clone(),
                    key,
                    index: position + 1,
                });
                self.by_record.insert(record.clone(), position);
                position
            }
        };
        &self.entries[position]
    }

    pub(crate) fn entries(&self) -> &[BibReference] {
        &self.entries
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn unique_key(&mut self, record: &BibRecord) -> String {
        let base = base_key(record);
        let mut key = base.clone();
        let mut n = 2;
        while self.keys.contains(&key) {
            key = format!("{base}-{n}");
            n += 1;
        }
        self.keys.insert(key.clone());
        key
    }
}

/// First author's family name, lower-cased ASCII alphanumerics, plus year.
fn base_key(record: &BibRecord) -> String {
    let mut key: String = record
        .authors
        .first()
        .map(|p| {
            p.family
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default();
    if key.is_empty() {
        key.push_str("ref");
    }
    if let Some(year) = record.year() {
        key.push_str(&year.to_string());
    }
    key
}

/// Author part of an author-style citation: `Weise`, `Weise and Chiong`,
/// or `Weise et al.`. Empty when the record names no authors.
pub(crate) fn citation_label(record: &BibRecord) -> String {
    match record.authors.as_slice() {
        [] => String::new(),
        [only] => only.family.clone(),
        [first, second] => format!("{} and {}", first.family, second.family),
        [first, ..] => format!("{} et al.", first.family),
    }
}
