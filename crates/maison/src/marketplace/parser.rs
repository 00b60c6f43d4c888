use std::collections::HashSet;

use regex::{Captures, Regex};

use super::domain::ScrapedItem;

const PRICE: &str = r"\$(?P<price>\d[\d,]*(?:\.\d{1,2})?)";

/// Extracts listing cards from a category page rendered as markdown.
///
/// Patterns run from strictest to loosest:
///
/// 1. image card with a bold title, a `by <brand>` line and a price
/// 2. image card with a bold title and a price
/// 3. a plain `[title](url)` link followed by a price
///
/// Every pattern runs over the whole page. An item is keyed by its resolved URL, so a card
/// already taken by a stricter pattern is never re-added by a looser one.
pub struct ListingParser {
    base_url: String,
    patterns: Vec<Regex>,
}

impl ListingParser {
    pub fn new(base_url: impl Into<String>) -> Result<Self, regex::Error> {
        let card = r"\[!\[[^\]]*\]\((?P<image>[^)\s]+)\)\]\((?P<url>[^)\s]+)\)\s*\*\*(?P<title>[^*\n]+)\*\*";
        let patterns = vec![
            Regex::new(&format!(r"{card}\s*by\s+(?P<brand>[^\n$]+?)\s*{PRICE}"))?,
            Regex::new(&format!(r"{card}\s*{PRICE}"))?,
            Regex::new(&format!(
                r"\[(?P<title>[^\[\]!\n]+)\]\((?P<url>(?:https?://|/)[^)\s]+)\)\s*{PRICE}"
            ))?,
        ];

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            patterns,
        })
    }

    /// Items in page order.
    pub fn parse(&self, markdown: &str) -> Vec<ScrapedItem> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for pattern in &self.patterns {
            for captures in pattern.captures_iter(markdown) {
                let Some(item) = self.item_from(&captures) else {
                    continue;
                };
                if seen.insert(item.source_url.clone()) {
                    let offset = captures.get(0).map_or(0, |m| m.start());
                    found.push((offset, item));
                }
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, item)| item).collect()
    }

    fn item_from(&self, captures: &Captures<'_>) -> Option<ScrapedItem> {
        let title = captures.name("title")?.as_str().trim();
        if title.is_empty() {
            return None;
        }

        Some(ScrapedItem {
            title: title.to_string(),
            brand: captures
                .name("brand")
                .map(|brand| brand.as_str().trim().to_string())
                .filter(|brand| !brand.is_empty()),
            price_cents: price_to_cents(captures.name("price")?.as_str())?,
            image_url: captures
                .name("image")
                .map(|image| self.absolute(image.as_str())),
            source_url: self.absolute(captures.name("url")?.as_str()),
        })
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            url.to_string()
        }
    }
}

/// `12,500` and `12,500.5` become `1_250_000` and `1_250_050`.
fn price_to_cents(raw: &str) -> Option<u64> {
    let (dollars, cents) = match raw.split_once('.') {
        Some((dollars, cents)) => (dollars, cents),
        None => (raw, ""),
    };
    let dollars: u64 = dollars.replace(',', "").parse().ok()?;
    let cents: u64 = match cents.len() {
        0 => 0,
        1 => cents.parse::<u64>().ok()? * 10,
        _ => cents.parse().ok()?,
    };
    dollars.checked_mul(100)?.checked_add(cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.1stdibs.com";

    fn parser() -> ListingParser {
        ListingParser::new(BASE).expect("patterns compile")
    }

    #[test]
    fn bylined_and_unbylined_cards_yield_two_items() {
        let page = "\
[![Submariner](https://img.example.com/sub.jpg)](https://www.1stdibs.com/jewelry/watches/sub/id-1/)
**Rolex Submariner Date**
by Rolex
$14,250

[![Necklace](https://img.example.com/pearl.jpg)](/jewelry/necklaces/pearl/id-2/)
**Akoya Pearl Strand**
$3,100.50
";
        let items = parser().parse(page);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Rolex Submariner Date");
        assert_eq!(items[0].brand.as_deref(), Some("Rolex"));
        assert_eq!(items[0].price_cents, 1_425_000);
        assert_eq!(
            items[0].image_url.as_deref(),
            Some("https://img.example.com/sub.jpg")
        );
        assert_eq!(
            items[0].source_url,
            "https://www.1stdibs.com/jewelry/watches/sub/id-1/"
        );

        assert_eq!(items[1].title, "Akoya Pearl Strand");
        assert_eq!(items[1].brand, None);
        assert_eq!(items[1].price_cents, 310_050);
        assert_eq!(
            items[1].source_url,
            "https://www.1stdibs.com/jewelry/necklaces/pearl/id-2/"
        );
    }

    #[test]
    fn bare_links_are_the_last_resort() {
        let page = "Featured: [Hermès Birkin 30](/fashion/handbags/birkin/id-9/) $38,000";
        let items = parser().parse(page);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Hermès Birkin 30");
        assert_eq!(items[0].image_url, None);
        assert_eq!(items[0].price_cents, 3_800_000);
    }

    #[test]
    fn repeated_cards_are_deduplicated_by_url() {
        let card = "[![a](https://img/a.jpg)](https://x.test/a)\n**Cartier Tank**\nby Cartier\n$6,000\n";
        let page = format!("{card}\n{card}\n[Cartier Tank](https://x.test/a) $6,000");

        assert_eq!(parser().parse(&page).len(), 1);
    }

    #[test]
    fn page_without_cards_yields_nothing() {
        assert!(parser()
            .parse("# Watches\n\nNo results for your filters.")
            .is_empty());
    }

    #[test]
    fn price_conversion_handles_separators_and_partial_cents() {
        assert_eq!(price_to_cents("1,000,000"), Some(100_000_000));
        assert_eq!(price_to_cents("9.5"), Some(950));
        assert_eq!(price_to_cents("abc"), None);
    }
}
