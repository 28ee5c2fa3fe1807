//! Search index over the catalog.
//!
//! The index is built once from a [`Catalog`] and answers two kinds of
//! request:
//!
//! - **Main search** ranks tables whose name or description matches a free
//!   text query. Column names and descriptions count as table tokens, so a
//!   column query finds every table carrying that column.
//! - **Autocomplete** returns at most [`AUTOCOMPLETE_LIMIT`] table and column
//!   names for a search box. Columns are suggested as `name:<column>`.
//!
//! Both are pure functions over `&self`; the index never changes after
//! construction.

pub mod tokenize;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;

pub use tokenize::{strip_markup, tokenize};

/// Maximum number of autocomplete suggestions.
pub const AUTOCOMPLETE_LIMIT: usize = 8;

/// Prefix marking a column suggestion.
pub const COLUMN_PREFIX: &str = "name:";

// ============================================================================
// Results
// ============================================================================

/// Why a table matched a search, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactName,
    NamePrefix,
    NameContains,
    Description,
    Tokens,
}

/// A ranked main-search match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub table: String,
    pub description: Option<String>,
    /// `None` when the query was blank and every table is listed.
    pub matched_on: Option<MatchKind>,
}

/// Restricts main search to part of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    All,
    /// Only tables loaded from this data package.
    Package(String),
}

impl SearchScope {
    fn admits(&self, package: Option<&str>) -> bool {
        match self {
            SearchScope::All => true,
            SearchScope::Package(wanted) => package == Some(wanted.as_str()),
        }
    }
}

// ============================================================================
// Index
// ============================================================================

#[derive(Debug, Clone)]
struct IndexedTable {
    name: String,
    name_lower: String,
    package: Option<String>,
    description: Option<String>,
    description_lower: String,
    tokens: BTreeSet<String>,
}

impl IndexedTable {
    fn rank(&self, needle: &str, terms: &[&str]) -> Option<MatchKind> {
        if self.name_lower == needle {
            Some(MatchKind::ExactName)
        } else if self.name_lower.starts_with(needle) {
            Some(MatchKind::NamePrefix)
        } else if self.name_lower.contains(needle) {
            Some(MatchKind::NameContains)
        } else if self.description_lower.contains(needle) {
            Some(MatchKind::Description)
        } else if terms
            .iter()
            .all(|term| self.tokens.iter().any(|token| token.contains(term)))
        {
            Some(MatchKind::Tokens)
        } else {
            None
        }
    }

    fn hit(&self, matched_on: Option<MatchKind>) -> SearchHit {
        SearchHit {
            table: self.name.clone(),
            description: self.description.clone(),
            matched_on,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SuggestionKind {
    Table,
    Column,
}

#[derive(Debug, Clone)]
struct Candidate {
    bare: String,
    lower: String,
    kind: SuggestionKind,
}

impl Candidate {
    fn render(&self) -> String {
        match self.kind {
            SuggestionKind::Table => self.bare.clone(),
            SuggestionKind::Column => format!("{}{}", COLUMN_PREFIX, self.bare),
        }
    }
}

/// How closely an autocomplete candidate matches, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Closeness {
    Exact,
    Prefix,
    Substring,
}

/// Read-only index for search and autocomplete.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    tables: Vec<IndexedTable>,
    candidates: Vec<Candidate>,
}

impl SearchIndex {
    /// Tokenize every table and column of the catalog.
    pub fn new(catalog: &Catalog) -> Self {
        let mut tables = Vec::with_capacity(catalog.len());
        let mut candidates = Vec::new();
        let mut column_names = BTreeSet::new();

        for table in catalog.list_tables() {
            let description_text = table
                .description
                .as_deref()
                .map(strip_markup)
                .unwrap_or_default();

            let mut tokens: BTreeSet<String> = tokenize(&table.name).into_iter().collect();
            tokens.extend(tokenize(&description_text));
            for column in &table.columns {
                tokens.insert(column.name.to_lowercase());
                tokens.extend(tokenize(&column.name));
                if let Some(description) = &column.description {
                    tokens.extend(tokenize(&strip_markup(description)));
                }
            }

            tables.push(IndexedTable {
                name: table.name.clone(),
                name_lower: table.name.to_lowercase(),
                package: table.package.clone(),
                description: table.description.clone(),
                description_lower: description_text.to_lowercase(),
                tokens,
            });

            candidates.push(Candidate {
                bare: table.name.clone(),
                lower: table.name.to_lowercase(),
                kind: SuggestionKind::Table,
            });
            for column in &table.columns {
                column_names.insert(column.name.clone());
            }
        }

        candidates.extend(column_names.into_iter().map(|name| Candidate {
            lower: name.to_lowercase(),
            bare: name,
            kind: SuggestionKind::Column,
        }));

        Self { tables, candidates }
    }

    /// Rank tables matching `query` across the whole catalog.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.search_scoped(query, &SearchScope::All)
    }

    /// Rank tables matching `query` within `scope`.
    ///
    /// A blank query lists every table in scope in catalog order. A query
    /// in `name:<column>` form, as returned by autocomplete, is matched on
    /// `<column>`.
    pub fn search_scoped(&self, query: &str, scope: &SearchScope) -> Vec<SearchHit> {
        let in_scope = self
            .tables
            .iter()
            .filter(|t| scope.admits(t.package.as_deref()));

        let needle = strip_column_prefix(query).to_lowercase();
        if needle.is_empty() {
            return in_scope.map(|t| t.hit(None)).collect();
        }

        let terms: Vec<&str> = needle.split_whitespace().collect();
        let mut ranked: Vec<(MatchKind, &IndexedTable)> = in_scope
            .filter_map(|t| t.rank(&needle, &terms).map(|kind| (kind, t)))
            .collect();
        ranked.sort_by(|(ka, a), (kb, b)| {
            ka.cmp(kb)
                .then_with(|| a.name_lower.cmp(&b.name_lower))
                .then_with(|| a.name.cmp(&b.name))
        });

        ranked
            .into_iter()
            .map(|(kind, t)| t.hit(Some(kind)))
            .collect()
    }

    /// Suggest at most [`AUTOCOMPLETE_LIMIT`] table and column names.
    ///
    /// Exact matches come before prefix matches, which come before substring
    /// matches; ties are alphabetical with tables first. A query of the form
    /// `name:<text>` is matched on `<text>`.
    pub fn autocomplete(&self, query: &str) -> Vec<String> {
        let needle = strip_column_prefix(query).to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(Closeness, &Candidate)> = self
            .candidates
            .iter()
            .filter_map(|c| closeness(&c.lower, &needle).map(|rank| (rank, c)))
            .collect();
        matches.sort_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then_with(|| a.lower.cmp(&b.lower))
                .then_with(|| a.bare.cmp(&b.bare))
                .then_with(|| a.kind.cmp(&b.kind))
        });

        matches
            .into_iter()
            .take(AUTOCOMPLETE_LIMIT)
            .map(|(_, c)| c.render())
            .collect()
    }

    /// Number of indexed tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn strip_column_prefix(query: &str) -> &str {
    let trimmed = query.trim();
    trimmed.strip_prefix(COLUMN_PREFIX).unwrap_or(trimmed).trim()
}

fn closeness(candidate: &str, needle: &str) -> Option<Closeness> {
    if candidate == needle {
        Some(Closeness::Exact)
    } else if candidate.starts_with(needle) {
        Some(Closeness::Prefix)
    } else if candidate.contains(needle) {
        Some(Closeness::Substring)
    } else {
        None
    }
}
