//! Ad hoc substring search over the loaded catalog
//!
//! No index is kept: each query scans whatever has been loaded so far, which
//! keeps results consistent with partially loaded state.

use super::types::CatalogEntry;

/// Filter `entries` by case-insensitive substring match on symbol or name
///
/// An empty (or whitespace-only) query returns everything. Symbol matches rank
/// before name-only matches; within each group the original order is kept.
pub fn search_entries(entries: &[CatalogEntry], query: &str) -> Vec<CatalogEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.to_vec();
    }

    let mut symbol_matches = Vec::new();
    let mut name_matches = Vec::new();

    for entry in entries {
        if entry.symbol.to_lowercase().contains(&needle) {
            symbol_matches.push(entry.clone());
        } else if entry.name.to_lowercase().contains(&needle) {
            name_matches.push(entry.clone());
        }
    }

    symbol_matches.extend(name_matches);
    symbol_matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(address: &str, symbol: &str, name: &str) -> CatalogEntry {
        CatalogEntry::new(address, symbol, name)
    }

    fn symbols(results: &[CatalogEntry]) -> Vec<&str> {
        results.iter().map(|e| e.symbol.as_str()).collect()
    }

    #[test]
    fn test_symbol_match_ranks_before_name_match() {
        let entries = vec![
            entry("a2", "STON", "Tonstart"),
            entry("a1", "TON", "Toncoin"),
        ];
        // "STON" also contains "ton" in its symbol, so both are symbol matches in input order
        assert_eq!(symbols(&search_entries(&entries, "ton")), vec!["STON", "TON"]);

        let entries = vec![
            entry("a2", "START", "Tonstart"),
            entry("a1", "TON", "Toncoin"),
        ];
        assert_eq!(symbols(&search_entries(&entries, "TON")), vec!["TON", "START"]);
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        let entries = vec![entry("a1", "AAA", "Alpha"), entry("a2", "BBB", "Beta")];
        assert_eq!(search_entries(&entries, ""), entries);
        assert_eq!(search_entries(&entries, "   "), entries);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let entries = vec![
            entry("a1", "USDT", "Tether"),
            entry("a2", "jUSDT", "Bridged Tether"),
            entry("a3", "USDC", "Circle"),
            entry("a4", "XYZ", "usd wrapped"),
        ];
        assert_eq!(
            symbols(&search_entries(&entries, "usd")),
            vec!["USDT", "jUSDT", "USDC", "XYZ"]
        );
    }

    #[test]
    fn test_no_match() {
        let entries = vec![entry("a1", "AAA", "Alpha")];
        assert!(search_entries(&entries, "zzz").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let entries: Vec<CatalogEntry> = (0..50)
            .map(|i| entry(&format!("a{}", i), &format!("T{}", i), &format!("Token {}", i)))
            .collect();
        assert_eq!(search_entries(&entries, "t1"), search_entries(&entries, "t1"));
    }
}
