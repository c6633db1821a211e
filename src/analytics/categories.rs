use std::collections::HashMap;

use serde::Serialize;

use crate::model::Product;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub products: usize,
    pub percent: f64,
}

/// Products per category for the pie chart, largest first
pub fn category_distribution(products: &[Product]) -> Vec<CategoryShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for product in products {
        *counts.entry(product.category.as_str()).or_insert(0) += 1;
    }

    let total = products.len() as f64;
    let mut shares: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(category, n)| CategoryShare {
            category: category.to_string(),
            products: n,
            percent: ((n as f64 / total) * 1000.0).round() / 10.0,
        })
        .collect();

    shares.sort_by(|a, b| b.products.cmp(&a.products).then_with(|| a.category.cmp(&b.category)));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, category: &str) -> Product {
        Product {
            id,
            name: format!("P{}", id),
            description: String::new(),
            sku: id.to_string(),
            category: category.to_string(),
            supplier_id: 0,
        }
    }

    #[test]
    fn test_empty() {
        assert!(category_distribution(&[]).is_empty());
    }

    #[test]
    fn test_counts_and_order() {
        let products = vec![
            product(1, "Cleats"),
            product(2, "Fishing"),
            product(3, "Cleats"),
            product(4, "Apparel"),
        ];
        let shares = category_distribution(&products);
        assert_eq!(shares[0].category, "Cleats");
        assert_eq!(shares[0].products, 2);
        assert_eq!(shares[0].percent, 50.0);
        // Ties sorted by name
        assert_eq!(shares[1].category, "Apparel");
        assert_eq!(shares[2].category, "Fishing");
        assert_eq!(shares[2].percent, 25.0);
    }
}
