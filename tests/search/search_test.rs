#[path = "../common/mod.rs"]
mod common;

use eelhole::search::{tokenize, MatchKind, SearchScope};
use proptest::prelude::*;
use rstest::rstest;

fn tables(hits: &[eelhole::search::SearchHit]) -> Vec<&str> {
    hits.iter().map(|h| h.table.as_str()).collect()
}

#[test]
fn test_plant_ranks_name_match_above_description_match() {
    let index = common::index();
    let hits = index.search("plant");

    assert_eq!(tables(&hits), vec!["plants_eia", "fuel_receipts"]);
    assert_eq!(hits[0].matched_on, Some(MatchKind::NamePrefix));
    assert_eq!(hits[1].matched_on, Some(MatchKind::Description));
}

#[test]
fn test_table_without_any_match_is_excluded() {
    let index = common::index();
    let hits = index.search("generating");

    // Only plants_eia mentions generating units
    assert_eq!(tables(&hits), vec!["plants_eia"]);
}

#[rstest]
#[case("capacity_mw")]
#[case("name:capacity_mw")]
#[case("  CAPACITY_MW ")]
fn test_column_query_finds_every_table_with_the_column(#[case] query: &str) {
    let index = common::index();
    let hits = index.search(query);

    assert_eq!(tables(&hits), vec!["generators", "plants_eia"]);
    assert!(hits.iter().all(|h| h.matched_on == Some(MatchKind::Tokens)));
}

#[test]
fn test_multi_term_query_matches_column_tokens() {
    let index = common::index();
    // "name" only appears in column names: supplier_name and name
    let hits = index.search("plant name");
    assert_eq!(tables(&hits), vec!["fuel_receipts", "plants_eia"]);
    assert!(hits.iter().all(|h| h.matched_on == Some(MatchKind::Tokens)));
}

#[rstest]
#[case("PLANTS_EIA", "plants_eia", MatchKind::ExactName)]
#[case("  plants_eia ", "plants_eia", MatchKind::ExactName)]
#[case("eia", "plants_eia", MatchKind::NameContains)]
#[case("county", "landscape_cover", MatchKind::Description)]
#[case("cover county", "landscape_cover", MatchKind::Tokens)]
fn test_match_kind(#[case] query: &str, #[case] table: &str, #[case] expected: MatchKind) {
    let index = common::index();
    let hit = index
        .search(query)
        .into_iter()
        .find(|h| h.table == table)
        .unwrap_or_else(|| panic!("{} not found for '{}'", table, query));
    assert_eq!(hit.matched_on, Some(expected));
}

#[test]
fn test_unmatched_query_is_empty() {
    let index = common::index();
    assert!(index.search("hydrology").is_empty());
}

#[test]
fn test_blank_query_lists_all_in_catalog_order() {
    let index = common::index();
    let hits = index.search("   ");

    assert_eq!(
        tables(&hits),
        vec!["fuel_receipts", "generators", "landscape_cover", "plants_eia"]
    );
    assert!(hits.iter().all(|h| h.matched_on.is_none()));
}

#[test]
fn test_package_scope() {
    let index = common::index();

    let hits = index.search_scoped("land", &SearchScope::Package("landscape".into()));
    assert_eq!(tables(&hits), vec!["landscape_cover"]);

    let hits = index.search_scoped("land", &SearchScope::Package("pudl".into()));
    assert!(hits.is_empty());

    let hits = index.search_scoped("", &SearchScope::Package("pudl".into()));
    assert_eq!(hits.len(), 3);
}

#[test]
fn test_search_is_read_only() {
    let index = common::index();
    let first = index.search("fuel");
    let second = index.search("fuel");
    assert_eq!(first, second);
    assert_eq!(index.len(), 4);
}

proptest! {
    /// Every hit matches on a substring of its name or description, or on
    /// all query terms against its name, description and column tokens.
    #[test]
    fn prop_hits_match_query(query in "[a-z_ ]{1,12}") {
        let catalog = common::catalog();
        let index = eelhole::search::SearchIndex::new(&catalog);
        let needle = query.trim().to_lowercase();
        prop_assume!(!needle.is_empty());

        for hit in index.search(&query) {
            let table = catalog.lookup_table(&hit.table).unwrap();
            let name = table.name.to_lowercase();
            let description = table
                .description
                .as_deref()
                .map(eelhole::search::strip_markup)
                .unwrap_or_default()
                .to_lowercase();

            let substring = name.contains(&needle) || description.contains(&needle);
            let mut tokens = tokenize(&table.name);
            tokens.extend(tokenize(&description));
            for column in &table.columns {
                tokens.push(column.name.to_lowercase());
                tokens.extend(tokenize(&column.name));
                tokens.extend(column.description.as_deref().map(tokenize).unwrap_or_default());
            }
            let all_terms = needle
                .split_whitespace()
                .all(|term| tokens.iter().any(|t| t.contains(term)));

            prop_assert!(substring || all_terms, "{} matched '{}'", hit.table, query);
        }
    }

    /// Ranking is non-decreasing in match kind.
    #[test]
    fn prop_hits_sorted_by_kind(query in "[a-z]{1,6}") {
        let index = common::index();
        let hits = index.search(&query);
        prop_assert!(hits.windows(2).all(|w| w[0].matched_on <= w[1].matched_on));
    }
}
