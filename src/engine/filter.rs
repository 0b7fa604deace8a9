use crate::catalog::types::Product;

/// Products matching `term`, in their original order.
///
/// A term that is blank after trimming matches everything. Otherwise the
/// untrimmed term is compared case-insensitively as a substring of the title,
/// description or category; any one field matching is enough.
pub fn filter_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    filter_indices(products, term)
        .into_iter()
        .map(|i| &products[i])
        .collect()
}

/// Same as [`filter_products`], as positions into `products`.
pub fn filter_indices(products: &[Product], term: &str) -> Vec<usize> {
    if term.trim().is_empty() {
        return (0..products.len()).collect();
    }
    let needle = term.to_lowercase();
    products
        .iter()
        .enumerate()
        .filter(|(_, p)| matches(p, &needle))
        .map(|(i, _)| i)
        .collect()
}

/// `needle` must already be lowercase.
fn matches(product: &Product, needle: &str) -> bool {
    [&product.title, &product.description, &product.category]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new(1, "Casual Slim Fit Shirt", "cotton", "men's clothing"),
            Product::new(2, "Gold Ring", "a ring for her", "jewelery"),
            Product::new(3, "Rain Jacket", "wind and rain", "women's clothing"),
            Product::new(4, "SSD 1TB", "fast storage", "electronics"),
            Product::new(5, "Short Sleeve SHIRT", "moisture wicking", "women's clothing"),
        ]
    }

    fn ids(products: &[&Product]) -> Vec<u64> {
        products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_empty_term_returns_everything() {
        let all = catalog();
        assert_eq!(ids(&filter_products(&all, "")), vec![1, 2, 3, 4, 5]);
        assert_eq!(ids(&filter_products(&all, "   ")), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_case_insensitive_title_match() {
        let all = catalog();
        assert_eq!(ids(&filter_products(&all, "shirt")), vec![1, 5]);
        assert_eq!(ids(&filter_products(&all, "ShIrT")), vec![1, 5]);
    }

    #[test]
    fn test_matches_any_field() {
        let all = catalog();
        // description only
        assert_eq!(ids(&filter_products(&all, "storage")), vec![4]);
        // category only
        assert_eq!(ids(&filter_products(&all, "women's")), vec![3, 5]);
        // title of one, description of another
        assert_eq!(ids(&filter_products(&all, "rain")), vec![3]);
        assert_eq!(ids(&filter_products(&all, "ring")), vec![2]);
    }

    #[test]
    fn test_untrimmed_term_keeps_spaces() {
        let all = catalog();
        assert_eq!(ids(&filter_products(&all, "slim fit")), vec![1]);
        assert!(filter_products(&all, " ssd ").is_empty());
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(filter_products(&catalog(), "zebra").is_empty());
    }

    #[test]
    fn test_subset_and_every_element_matches() {
        let all = catalog();
        for term in ["a", "in", "CLOTH", "s", "1", "gold"] {
            let filtered = filter_products(&all, term);
            let needle = term.to_lowercase();
            for p in &filtered {
                assert!(all.iter().any(|q| q == *p));
                assert!(matches(p, &needle), "{} should match {}", p.title, term);
            }
            // idempotent and order-preserving
            assert_eq!(ids(&filtered), ids(&filter_products(&all, term)));
            let positions: Vec<usize> = filtered
                .iter()
                .map(|p| all.iter().position(|q| q.id == p.id).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
