//! Views derived from a store snapshot
//!
//! None of these touch the store; recompute them whenever the snapshot changes.

use std::collections::HashSet;

use crate::models::{Product, ProductId};

/// Distinct categories, in the order they first appear
pub fn categories(products: &[Product]) -> Vec<&str> {
    distinct(products.iter().map(|p| p.category.as_str()))
}

/// Distinct brands within one category, in the order they first appear
pub fn brands<'a>(products: &'a [Product], category: &str) -> Vec<&'a str> {
    distinct(
        products
            .iter()
            .filter(|p| p.category == category)
            .map(|p| p.brand.as_str()),
    )
}

/// Products matching an optional category and an optional brand
pub fn filter<'a>(
    products: &'a [Product],
    category: Option<&str>,
    brand: Option<&str>,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| category.is_none_or(|c| p.category == c))
        .filter(|p| brand.is_none_or(|b| p.brand == b))
        .collect()
}

/// Feed order: liked products first, otherwise the original order
pub fn feed<'a>(products: &'a [Product], liked: &HashSet<ProductId>) -> Vec<&'a Product> {
    let (mut first, rest): (Vec<_>, Vec<_>) =
        products.iter().partition(|p| liked.contains(&p.id));
    first.extend(rest);
    first
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, category: &str, brand: &str) -> Product {
        Product {
            id: ProductId::from(id),
            title: format!("item {id}"),
            brand: brand.to_string(),
            price: None,
            url: None,
            category: category.to_string(),
            image_url: None,
            owner_id: None,
            created_at: None,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "shoes", "Nike"),
            product("2", "bags", "Loewe"),
            product("3", "shoes", "Adidas"),
            product("4", "shoes", "Nike"),
        ]
    }

    #[test]
    fn test_categories_are_distinct() {
        let products = catalog();
        assert_eq!(categories(&products[..3]), ["shoes", "bags"]);
    }

    #[test]
    fn test_brands_within_category() {
        let products = catalog();
        assert_eq!(brands(&products, "shoes"), ["Nike", "Adidas"]);
        assert_eq!(brands(&products, "bags"), ["Loewe"]);
        assert!(brands(&products, "hats").is_empty());
    }

    #[test]
    fn test_filter() {
        let products = catalog();
        let ids = |v: Vec<&Product>| v.iter().map(|p| p.id.to_string()).collect::<Vec<_>>();

        assert_eq!(ids(filter(&products, Some("shoes"), Some("Nike"))), ["1", "4"]);
        assert_eq!(ids(filter(&products, Some("shoes"), None)), ["1", "3", "4"]);
        assert_eq!(ids(filter(&products, None, None)).len(), 4);
        assert!(filter(&products, Some("bags"), Some("Nike")).is_empty());
    }

    #[test]
    fn test_feed_puts_liked_first() {
        let products = &catalog()[..3];
        let liked = HashSet::from([ProductId::from("2")]);

        let order: Vec<_> = feed(products, &liked).iter().map(|p| p.id.to_string()).collect();
        assert_eq!(order, ["2", "1", "3"]);
    }

    #[test]
    fn test_feed_is_stable_among_liked() {
        let products = catalog();
        let liked = HashSet::from([ProductId::from("4"), ProductId::from("1")]);

        let order: Vec<_> = feed(&products, &liked).iter().map(|p| p.id.to_string()).collect();
        assert_eq!(order, ["1", "4", "2", "3"]);
    }
}
