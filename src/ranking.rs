use crate::schema::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    pub name: String,
    pub value: f64,
}

/// Name → value accumulator that remembers first-insertion order.
///
/// Ranking sorts are stable, so equal values keep the order in which their
/// names were first seen.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    positions: HashMap<String, usize>,
    entries: Vec<(String, f64)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, amount: f64) {
        match self.positions.get(name) {
            Some(&idx) => self.entries[idx].1 += amount,
            None => {
                self.positions.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), amount));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.positions.get(name).map(|&idx| self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest `n` values, descending.
    pub fn top(self, n: usize) -> Vec<RankedItem> {
        let mut ranked: Vec<RankedItem> = self
            .entries
            .into_iter()
            .map(|(name, value)| RankedItem { name, value })
            .collect();
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked.truncate(n);
        ranked
    }
}

/// Code → display name lookup for one master-data collection.
fn name_lookup<'a, T>(
    records: &'a [T],
    code: impl Fn(&'a T) -> Option<&'a String>,
    name: impl Fn(&'a T) -> Option<&'a String>,
) -> HashMap<&'a str, &'a str> {
    records
        .iter()
        .filter_map(|r| Some((code(r)?.as_str(), name(r)?.as_str())))
        .collect()
}

pub fn sales_by_client(
    items: &[&InvoiceItem],
    headers: &HashMap<&str, &Invoice>,
    customers: &[Customer],
) -> Tally {
    let names = name_lookup(customers, |c| c.codclie.as_ref(), |c| c.descrip.as_ref());
    let mut tally = Tally::new();
    for item in items {
        let (Some(doc), Some(total)) = (item.numerod.as_deref(), item.totalitem) else {
            continue;
        };
        let client = headers
            .get(doc)
            .and_then(|h| h.codclie.as_deref())
            .and_then(|code| names.get(code));
        if let Some(client) = client {
            tally.add(client, total);
        }
    }
    tally
}

pub fn sales_by_seller(
    items: &[&InvoiceItem],
    headers: &HashMap<&str, &Invoice>,
    sellers: &[Seller],
) -> Tally {
    let names = name_lookup(sellers, |s| s.codvend.as_ref(), |s| s.descrip.as_ref());
    let mut tally = Tally::new();
    for item in items {
        let (Some(doc), Some(total)) = (item.numerod.as_deref(), item.totalitem) else {
            continue;
        };
        let seller = headers
            .get(doc)
            .and_then(|h| h.codvend.as_deref())
            .and_then(|code| names.get(code));
        if let Some(seller) = seller {
            tally.add(seller, total);
        }
    }
    tally
}

pub fn sales_by_product(items: &[&InvoiceItem], products: &[Product]) -> Tally {
    let names = name_lookup(products, |p| p.codprod.as_ref(), |p| p.descrip.as_ref());
    let mut tally = Tally::new();
    for item in items {
        let (Some(code), Some(total)) = (item.coditem.as_deref(), item.totalitem) else {
            continue;
        };
        if let Some(name) = names.get(code) {
            tally.add(name, total);
        }
    }
    tally
}

/// Profit per product name: (unit price − current cost) × quantity.
pub fn profit_by_product(items: &[&InvoiceItem], products: &[Product]) -> Tally {
    let catalog: HashMap<&str, &Product> = products
        .iter()
        .filter_map(|p| Some((p.codprod.as_deref()?, p)))
        .collect();

    let mut tally = Tally::new();
    for item in items {
        let Some(product) = item.coditem.as_deref().and_then(|code| catalog.get(code)) else {
            continue;
        };
        if let (Some(price), Some(cost), Some(qty), Some(name)) =
            (item.precio, product.costact, item.cantidad, product.descrip.as_deref())
        {
            tally.add(name, (price - cost) * qty);
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(doc: &str, code: &str, total: f64) -> InvoiceItem {
        InvoiceItem {
            numerod: Some(doc.to_string()),
            coditem: Some(code.to_string()),
            totalitem: Some(total),
            ..Default::default()
        }
    }

    fn product(code: &str, name: &str, cost: Option<f64>) -> Product {
        Product {
            codprod: Some(code.to_string()),
            descrip: Some(name.to_string()),
            costact: cost,
            ..Default::default()
        }
    }

    #[test]
    fn test_tally_top_is_capped_and_descending() {
        let mut tally = Tally::new();
        for (i, name) in ["a", "b", "c", "d", "e", "f", "g"].iter().enumerate() {
            tally.add(name, i as f64);
        }
        tally.add("a", 100.0);

        let top = tally.top(TOP_N);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "a");
        assert_eq!(top[0].value, 100.0);
        assert_eq!(top[1].name, "g");
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn test_tally_ties_keep_first_seen_order() {
        let mut tally = Tally::new();
        tally.add("zeta", 10.0);
        tally.add("alpha", 10.0);
        tally.add("mid", 10.0);

        let names: Vec<String> = tally.top(TOP_N).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_sales_by_client_resolves_through_header() {
        let headers_src = vec![
            Invoice {
                numerod: Some("F1".to_string()),
                codclie: Some("C1".to_string()),
                ..Default::default()
            },
            Invoice {
                numerod: Some("F2".to_string()),
                codclie: Some("C-unknown".to_string()),
                ..Default::default()
            },
        ];
        let headers: HashMap<&str, &Invoice> = headers_src
            .iter()
            .map(|h| (h.numerod.as_deref().unwrap(), h))
            .collect();
        let customers = vec![Customer {
            codclie: Some("C1".to_string()),
            descrip: Some("Acme".to_string()),
            ..Default::default()
        }];
        let items = vec![item("F1", "P1", 30.0), item("F1", "P2", 12.5), item("F2", "P1", 99.0)];
        let refs: Vec<&InvoiceItem> = items.iter().collect();

        let tally = sales_by_client(&refs, &headers, &customers);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally.get("Acme"), Some(42.5));
    }

    #[test]
    fn test_profit_by_product_needs_all_inputs() {
        let products = vec![product("P1", "Widget", Some(4.0)), product("P2", "Gadget", None)];
        let mut with_price = item("F1", "P1", 0.0);
        with_price.precio = Some(10.0);
        with_price.cantidad = Some(3.0);
        let mut no_cost = item("F1", "P2", 0.0);
        no_cost.precio = Some(10.0);
        no_cost.cantidad = Some(1.0);
        let items = [with_price, no_cost];
        let refs: Vec<&InvoiceItem> = items.iter().collect();

        let tally = profit_by_product(&refs, &products);
        assert_eq!(tally.get("Widget"), Some(18.0));
        assert_eq!(tally.get("Gadget"), None);
    }
}
