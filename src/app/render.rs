//! Plain-text rendering of store snapshots

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;

use crate::models::Product;
use crate::store::StoreState;
use crate::views;

/// Marker for a liked product
pub const LIKED: &str = "♥";

/// Marker for a product that is not liked
pub const NOT_LIKED: &str = "♡";

const RULE_WIDTH: usize = 60;

/// Feed view: liked first, capped at `limit`
pub fn feed(state: &StoreState, limit: usize) -> String {
    if let Some(empty) = empty_state(state) {
        return empty;
    }

    let ordered = views::feed(&state.products, &state.liked_ids);
    let shown = &ordered[..ordered.len().min(limit)];

    let mut out = format!("🛍  Feed ({} products)\n{}\n", state.products.len(), rule());
    out.push_str(&table(shown, |p| state.is_liked(&p.id)));
    if ordered.len() > shown.len() {
        let _ = write!(out, "\n… and {} more", ordered.len() - shown.len());
    }
    out
}

/// Filtered product list
pub fn products(state: &StoreState, category: Option<&str>, brand: Option<&str>) -> String {
    if let Some(empty) = empty_state(state) {
        return empty;
    }

    let matching = views::filter(&state.products, category, brand);
    let heading = match (category, brand) {
        (Some(c), Some(b)) => format!("{b} · {c}"),
        (Some(c), None) => c.to_string(),
        (None, Some(b)) => b.to_string(),
        (None, None) => "All products".to_string(),
    };

    if matching.is_empty() {
        return format!("{heading}\n{}\nNo products match.", rule());
    }

    format!(
        "{heading} ({})\n{}\n{}",
        matching.len(),
        rule(),
        table(&matching, |p| state.is_liked(&p.id))
    )
}

/// Category list
pub fn categories(state: &StoreState) -> String {
    list("Categories", &views::categories(&state.products), "No categories yet.")
}

/// Brands in one category
pub fn brands(state: &StoreState, category: &str) -> String {
    list(
        &format!("Brands in {category}"),
        &views::brands(&state.products, category),
        "No brands in this category.",
    )
}

/// Full details of one product
pub fn detail(product: &Product, liked: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", product.brand.to_uppercase());
    let _ = writeln!(out, "{}", product.title);
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Category  {}", product.category);
    let _ = writeln!(out, "Price     {}", product.display_price().unwrap_or("-"));
    let _ = writeln!(
        out,
        "Image     {}",
        product.image_url.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(
        out,
        "Link      {}",
        product.link().unwrap_or("No link available")
    );
    let _ = writeln!(
        out,
        "Liked     {}",
        if liked { LIKED } else { NOT_LIKED }
    );
    if let Some(created) = product.created_at {
        let _ = writeln!(out, "Listed    {}", created.format("%Y-%m-%d %H:%M"));
    }
    let _ = write!(out, "Id        {}", product.id);
    out
}

/// One-line status for the session prompt
pub fn status(state: &StoreState) -> String {
    if state.loading {
        return "Loading…".to_string();
    }
    match &state.error {
        Some(error) => format!("⚠ {error}"),
        None => format!(
            "{} products · {} liked",
            state.products.len(),
            state.liked_ids.len()
        ),
    }
}

fn empty_state(state: &StoreState) -> Option<String> {
    if !state.products.is_empty() {
        return None;
    }
    Some(match (&state.error, state.loading) {
        (Some(error), _) => format!("Could not load products: {error}"),
        (None, true) => "Loading…".to_string(),
        (None, false) => "No products yet. Upload the first one!".to_string(),
    })
}

fn table(products: &[&Product], liked: impl Fn(&Product) -> bool) -> String {
    let id_width = column_width(products.iter().map(|p| p.id.as_str()));
    let brand_width = column_width(products.iter().map(|p| p.brand.as_str()));

    products
        .iter()
        .map(|&p| {
            let marker = if liked(p) { LIKED } else { NOT_LIKED };
            let price = p.display_price().map(|price| format!("  {price}")).unwrap_or_default();
            format!(
                "{marker} {}  {}  {}{price}",
                pad(p.id.as_str(), id_width),
                pad(&p.brand, brand_width),
                p.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list(heading: &str, items: &[&str], empty: &str) -> String {
    if items.is_empty() {
        return format!("{heading}\n{}\n{empty}", rule());
    }
    let lines: Vec<String> = items.iter().map(|item| format!("  • {item}")).collect();
    format!("{heading}\n{}\n{}", rule(), lines.join("\n"))
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.map(UnicodeWidthStr::width).max().unwrap_or(0)
}

/// Pad to a display width (wide glyphs count double)
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::models::ProductId;

    fn product(id: &str, brand: &str, title: &str, category: &str) -> Product {
        Product {
            id: ProductId::from(id),
            title: title.into(),
            brand: brand.into(),
            price: None,
            url: None,
            category: category.into(),
            image_url: None,
            owner_id: None,
            created_at: None,
        }
    }

    fn state(products: Vec<Product>, liked: &[&str]) -> StoreState {
        StoreState {
            products: Arc::new(products),
            liked_ids: liked.iter().map(|id| ProductId::from(*id)).collect::<HashSet<_>>(),
            loading: false,
            error: None,
        }
    }

    #[test]
    fn test_feed_puts_liked_first() {
        let s = state(
            vec![
                product("1", "Nike", "Air Max", "shoes"),
                product("2", "Loewe", "Puzzle", "bags"),
                product("3", "Adidas", "Samba", "shoes"),
            ],
            &["2"],
        );
        let out = feed(&s, 50);
        let rows: Vec<&str> = out.lines().skip(2).collect();
        assert!(rows[0].starts_with("♥ 2"));
        assert!(rows[1].starts_with("♡ 1"));
        assert!(rows[2].starts_with("♡ 3"));
    }

    #[test]
    fn test_feed_limit() {
        let s = state(
            vec![
                product("1", "Nike", "Air Max", "shoes"),
                product("2", "Nike", "Dunk", "shoes"),
            ],
            &[],
        );
        let out = feed(&s, 1);
        assert!(out.ends_with("… and 1 more"));
    }

    #[test]
    fn test_brand_column_uses_display_width() {
        let s = state(
            vec![
                product("1", "ナイキ", "Air Max", "shoes"),
                product("2", "Nike", "Dunk", "shoes"),
            ],
            &[],
        );
        let out = feed(&s, 50);
        let rows: Vec<&str> = out.lines().skip(2).collect();
        // "ナイキ" is six columns wide, so "Nike" gets two extra spaces
        assert!(rows[1].contains("Nike    Dunk"));
        assert!(rows[0].contains("ナイキ  Air Max"));
    }

    #[test]
    fn test_empty_states() {
        let mut s = state(Vec::new(), &[]);
        assert!(feed(&s, 10).contains("No products yet"));

        s.error = Some("boom".into());
        assert_eq!(feed(&s, 10), "Could not load products: boom");
        assert_eq!(status(&s), "⚠ boom");
    }

    #[test]
    fn test_products_heading() {
        let s = state(
            vec![
                product("1", "Nike", "Air Max", "shoes"),
                product("2", "Loewe", "Puzzle", "bags"),
            ],
            &[],
        );
        assert!(products(&s, Some("shoes"), Some("Nike")).starts_with("Nike · shoes (1)"));
        assert!(products(&s, Some("hats"), None).ends_with("No products match."));
    }

    #[test]
    fn test_lists() {
        let s = state(
            vec![
                product("1", "Nike", "Air Max", "shoes"),
                product("2", "Loewe", "Puzzle", "bags"),
                product("3", "Adidas", "Samba", "shoes"),
            ],
            &[],
        );
        assert!(categories(&s).ends_with("  • shoes\n  • bags"));
        assert!(brands(&s, "shoes").ends_with("  • Nike\n  • Adidas"));
        assert!(brands(&s, "hats").ends_with("No brands in this category."));
    }

    #[test]
    fn test_detail_without_link() {
        let p = product("9", "Loewe", "Puzzle", "bags");
        let out = detail(&p, true);
        assert!(out.starts_with("LOEWE\nPuzzle"));
        assert!(out.contains("Link      No link available"));
        assert!(out.contains("Liked     ♥"));
        assert!(out.contains("Price     -"));
    }
}
