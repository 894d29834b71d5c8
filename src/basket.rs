//! Product co-occurrence across invoice documents.

use crate::schema::{InvoiceItem, Product};
use crate::utils::Window;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketBasketResult {
    pub item_a: String,
    pub item_b: String,
    /// Share of baskets holding `item_a` that also hold `item_b`.
    pub confidence: f64,
    /// Share of all baskets holding both items.
    pub support: f64,
}

/// Cut-offs applied to candidate pairs. Both minimums are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BasketThresholds {
    pub min_confidence: f64,
    pub min_support: f64,
    pub limit: usize,
}

impl Default for BasketThresholds {
    fn default() -> Self {
        Self {
            min_confidence: 0.1,
            min_support: 0.01,
            limit: 20,
        }
    }
}

/// Runs the analysis with the default thresholds.
pub fn analyze_market_basket(
    items: &[InvoiceItem],
    products: &[Product],
    window: Option<&Window>,
) -> Vec<MarketBasketResult> {
    analyze_with_thresholds(items, products, window, &BasketThresholds::default())
}

pub fn analyze_with_thresholds(
    items: &[InvoiceItem],
    products: &[Product],
    window: Option<&Window>,
    thresholds: &BasketThresholds,
) -> Vec<MarketBasketResult> {
    let names: HashMap<&str, &str> = products
        .iter()
        .filter_map(|p| Some((p.codprod.as_deref()?, p.descrip.as_deref()?)))
        .collect();

    let baskets = build_baskets(items, window);
    if baskets.is_empty() {
        return Vec::new();
    }
    let total_baskets = baskets.len() as f64;

    let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
    let mut pairs: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for basket in baskets.values() {
        let codes: Vec<&str> = basket.iter().copied().collect();
        for (i, &a) in codes.iter().enumerate() {
            *occurrences.entry(a).or_insert(0) += 1;
            for &b in &codes[i + 1..] {
                *pairs.entry((a, b)).or_insert(0) += 1;
                *pairs.entry((b, a)).or_insert(0) += 1;
            }
        }
    }

    let mut results: Vec<MarketBasketResult> = pairs
        .into_iter()
        .filter_map(|((a, b), count)| {
            let count = count as f64;
            let support = count / total_baskets;
            let confidence = count / *occurrences.get(a)? as f64;
            if confidence <= thresholds.min_confidence || support <= thresholds.min_support {
                return None;
            }
            Some(MarketBasketResult {
                item_a: names.get(a)?.to_string(),
                item_b: names.get(b)?.to_string(),
                confidence,
                support,
            })
        })
        .collect();

    results.sort_by(|x, y| y.confidence.total_cmp(&x.confidence));
    results.truncate(thresholds.limit);

    debug!(
        "Market basket: {} baskets, {} associations kept",
        baskets.len(),
        results.len()
    );
    results
}

/// Distinct item codes per document, skipping items outside the window.
///
/// Unnamed products still form and fill baskets so that they count toward the
/// basket total; their pairs are only dropped when results are emitted.
fn build_baskets<'a>(
    items: &'a [InvoiceItem],
    window: Option<&Window>,
) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
    let mut baskets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for item in items {
        if let Some(window) = window {
            if !window.contains_record_date(item.fechae.as_deref()) {
                continue;
            }
        }
        let (Some(doc), Some(code)) = (item.numerod.as_deref(), item.coditem.as_deref()) else {
            continue;
        };
        baskets.entry(doc).or_default().insert(code);
    }
    baskets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line(doc: &str, code: &str) -> InvoiceItem {
        InvoiceItem {
            numerod: Some(doc.to_string()),
            coditem: Some(code.to_string()),
            fechae: Some("2024-06-10 12:00:00".to_string()),
            ..Default::default()
        }
    }

    fn catalog(codes: &[&str]) -> Vec<Product> {
        codes
            .iter()
            .map(|code| Product {
                codprod: Some(code.to_string()),
                descrip: Some(format!("Product {}", code)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_pair_in_every_basket() {
        let items = vec![line("D1", "A"), line("D1", "B"), line("D2", "A"), line("D2", "B")];
        let results = analyze_market_basket(&items, &catalog(&["A", "B"]), None);

        assert_eq!(results.len(), 2);
        let ab = results
            .iter()
            .find(|r| r.item_a == "Product A" && r.item_b == "Product B")
            .unwrap();
        assert!((ab.support - 1.0).abs() < 1e-9);
        assert!((ab.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_baskets_yields_empty_result() {
        assert!(analyze_market_basket(&[], &catalog(&["A"]), None).is_empty());

        // every line lacks a resolvable name
        let items = vec![line("D1", "X"), line("D1", "Y")];
        assert!(analyze_market_basket(&items, &catalog(&["A"]), None).is_empty());
    }

    #[test]
    fn test_duplicate_lines_count_once_per_basket() {
        let items = vec![
            line("D1", "A"),
            line("D1", "A"),
            line("D1", "B"),
            line("D2", "A"),
            line("D3", "C"),
        ];
        let results = analyze_market_basket(&items, &catalog(&["A", "B", "C"]), None);

        let ab = results
            .iter()
            .find(|r| r.item_a == "Product A" && r.item_b == "Product B")
            .unwrap();
        // A appears in two baskets, together with B in one
        assert!((ab.confidence - 0.5).abs() < 1e-9);
        assert!((ab.support - 1.0 / 3.0).abs() < 1e-9);

        let ba = results
            .iter()
            .find(|r| r.item_a == "Product B" && r.item_b == "Product A")
            .unwrap();
        assert!((ba.confidence - 1.0).abs() < 1e-9);
        assert_eq!(results[0].item_a, "Product B");
    }

    #[test]
    fn test_window_filters_lines_by_their_date() {
        let mut old = line("D9", "A");
        old.fechae = Some("2023-01-01 00:00:00".to_string());
        let mut old_b = line("D9", "B");
        old_b.fechae = Some("2023-01-01 00:00:00".to_string());
        let items = vec![old, old_b, line("D1", "A")];

        let window = Window::from_dates(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
        .unwrap();

        assert!(analyze_market_basket(&items, &catalog(&["A", "B"]), Some(&window)).is_empty());
        assert_eq!(
            analyze_market_basket(&items, &catalog(&["A", "B"]), None).len(),
            2
        );
    }

    #[test]
    fn test_unnamed_only_documents_still_count_as_baskets() {
        let mut items: Vec<InvoiceItem> =
            (0..150).map(|i| line(&format!("U{}", i), "Z")).collect();
        items.push(line("D1", "A"));
        items.push(line("D1", "B"));
        let products = catalog(&["A", "B"]);

        // 1 of 151 baskets holds the pair, below the 1% support floor
        assert!(analyze_market_basket(&items, &products, None).is_empty());

        let relaxed = BasketThresholds {
            min_confidence: 0.0,
            min_support: 0.0,
            limit: 20,
        };
        let results = analyze_with_thresholds(&items, &products, None, &relaxed);
        assert_eq!(results.len(), 2);
        assert!((results[0].support - 1.0 / 151.0).abs() < 1e-9);
    }

    #[test]
    fn test_unnamed_partner_is_dropped_from_results() {
        let items = vec![
            line("D1", "A"),
            line("D1", "Z"),
            line("D2", "A"),
            line("D2", "B"),
        ];
        let results = analyze_market_basket(&items, &catalog(&["A", "B"]), None);

        // A is in both baskets, B in one
        let ab = results
            .iter()
            .find(|r| r.item_a == "Product A" && r.item_b == "Product B")
            .unwrap();
        assert!((ab.confidence - 0.5).abs() < 1e-9);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_thresholds_and_limit() {
        // 200 single-item baskets dilute support below the minimum
        let mut items: Vec<InvoiceItem> =
            (0..200).map(|i| line(&format!("S{}", i), "C")).collect();
        items.push(line("D1", "A"));
        items.push(line("D1", "B"));
        let products = catalog(&["A", "B", "C"]);

        assert!(analyze_market_basket(&items, &products, None).is_empty());

        let relaxed = BasketThresholds {
            min_confidence: 0.0,
            min_support: 0.0,
            limit: 1,
        };
        assert_eq!(
            analyze_with_thresholds(&items, &products, None, &relaxed).len(),
            1
        );
    }
}
