//! Summary extraction: listing card → partial record
//!
//! A listing card is the per-property summary block on a paginated index page.
//! Extraction is pure: it reads a parsed tree and an already-seen identifier
//! set, and produces a [`PartialRecord`] or nothing. A card without the
//! labeled identifier marker is not a listing; a card whose identifier is
//! already known is skipped here, before any detail fetch is spent on it.

use crate::record::PartialRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Selector matching one listing card on an index page.
pub const CARD_SELECTOR: &str = "div.block_one_synopsis_advert";

/// The labeled marker that precedes the listing identifier.
const ID_MARKER: &str = "Elan №";

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// Extracts all new listing partials from a parsed index page.
///
/// Cards that are not listings or whose identifier is already in `seen` are
/// dropped silently.
pub fn extract_cards(document: &Html, seen: &HashSet<String>, base: &Url) -> Vec<PartialRecord> {
    let Ok(selector) = Selector::parse(CARD_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|card| extract_card(card, seen, base))
        .collect()
}

/// Extracts a partial record from one listing card.
///
/// Returns `None` when the card bears no identifier marker (not a listing) or
/// when the identifier is already in `seen` (duplicate skip). Any other field
/// whose expected markup is absent is simply omitted.
pub fn extract_card(
    card: ElementRef<'_>,
    seen: &HashSet<String>,
    base: &Url,
) -> Option<PartialRecord> {
    let elan_id = find_listing_id(card)?;

    if seen.contains(&elan_id) {
        tracing::debug!("Skipping already harvested listing {}", elan_id);
        return None;
    }

    let mut partial = PartialRecord {
        elan_id,
        ..Default::default()
    };

    // Title and detail-page URL sit in the card heading
    if let Some(link) = select_first(card, "h2 a") {
        let title = select_text(link, "span[itemprop='name']")
            .or_else(|| non_empty(clean_text(link)));
        partial.title = title;

        if let Some(href) = link.value().attr("href") {
            if let Ok(absolute) = base.join(href) {
                partial.url = Some(absolute.to_string());
            }
        }
    }

    partial.price = select_text(card, "span.value_cost_adv").map(strip_spaces);
    partial.currency = select_text(card, "span.value_currency");
    partial.location = select_text(card, "div.block_name_region_adv");

    if let Some(block) = select_first(card, "div.block_name_category_adv") {
        partial.category = select_text(block, "span[style*='ea6f24']");
        partial.subcategory = find_subcategory(block, partial.category.as_deref());
    }

    partial.short_description = select_text(card, "div.short-text-ads");
    partial.date_posted = select_text(card, "span[itemprop='datePosted']");

    Some(partial)
}

/// Finds the identifier digits in the element bearing the `Elan №` marker.
/// Works on a card as well as on a whole detail page.
pub fn find_listing_id(scope: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("span").ok()?;
    for element in scope.select(&selector) {
        let text = clean_text(element);
        if text.contains(ID_MARKER) {
            if let Some(found) = digits_re().find(&text) {
                return Some(found.as_str().to_string());
            }
        }
    }
    None
}

/// First element matching `css` inside `scope`, if any.
pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

/// Whitespace-normalized text of the first element matching `css`, if any and
/// non-empty.
pub(crate) fn select_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(scope, css).and_then(|el| non_empty(clean_text(el)))
}

/// Collects an element's text with runs of whitespace collapsed to single
/// spaces.
pub(crate) fn clean_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn strip_spaces(text: String) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The category block carries the highlighted category span plus plain spans
/// for the subcategory; the first plain span with different text wins.
fn find_subcategory(block: ElementRef<'_>, category: Option<&str>) -> Option<String> {
    let selector = Selector::parse("span").ok()?;
    block
        .select(&selector)
        .filter(|el| {
            el.value()
                .attr("style")
                .map_or(true, |style| !style.contains("ea6f24"))
        })
        .filter_map(|el| non_empty(clean_text(el)))
        .find(|text| Some(text.as_str()) != category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://birja-in.az").unwrap()
    }

    fn card_html(inner: &str) -> Html {
        Html::parse_fragment(&format!(
            r#"<div class="block_one_synopsis_advert">{}</div>"#,
            inner
        ))
    }

    fn first_card(document: &Html) -> ElementRef<'_> {
        let selector = Selector::parse(CARD_SELECTOR).unwrap();
        document.select(&selector).next().unwrap()
    }

    const FULL_CARD: &str = r#"
        <span>Elan № 123456</span>
        <h2><a href="/elan/123456-ev-satilir.html">
            <span itemprop="name">3 otaqlı mənzil, Yasamal</span>
        </a></h2>
        <span class="value_cost_adv">85 000</span>
        <span class="value_currency">AZN</span>
        <div class="block_name_region_adv">Bakı</div>
        <div class="block_name_category_adv">
            <span style="color: #ea6f24;">Ev alqı-satqısı</span>
            <span>Mənzillər</span>
        </div>
        <div class="short-text-ads">Təcili satılır, əla təmirli.</div>
        <span itemprop="datePosted">05.08.2026</span>
    "#;

    #[test]
    fn test_full_card_extraction() {
        let document = card_html(FULL_CARD);
        let partial = extract_card(first_card(&document), &HashSet::new(), &base()).unwrap();

        assert_eq!(partial.elan_id, "123456");
        assert_eq!(partial.title.as_deref(), Some("3 otaqlı mənzil, Yasamal"));
        assert_eq!(
            partial.url.as_deref(),
            Some("https://birja-in.az/elan/123456-ev-satilir.html")
        );
        assert_eq!(partial.price.as_deref(), Some("85000"));
        assert_eq!(partial.currency.as_deref(), Some("AZN"));
        assert_eq!(partial.location.as_deref(), Some("Bakı"));
        assert_eq!(partial.category.as_deref(), Some("Ev alqı-satqısı"));
        assert_eq!(partial.subcategory.as_deref(), Some("Mənzillər"));
        assert_eq!(
            partial.short_description.as_deref(),
            Some("Təcili satılır, əla təmirli.")
        );
        assert_eq!(partial.date_posted.as_deref(), Some("05.08.2026"));
    }

    #[test]
    fn test_card_without_identifier_is_not_a_listing() {
        let document = card_html(r#"<h2><a href="/banner.html">Reklam</a></h2>"#);
        assert!(extract_card(first_card(&document), &HashSet::new(), &base()).is_none());
    }

    #[test]
    fn test_already_seen_identifier_is_skipped() {
        let document = card_html(FULL_CARD);
        let seen: HashSet<String> = ["123456".to_string()].into_iter().collect();
        assert!(extract_card(first_card(&document), &seen, &base()).is_none());
    }

    #[test]
    fn test_missing_optional_fields_are_omitted() {
        let document = card_html("<span>Elan № 42</span>");
        let partial = extract_card(first_card(&document), &HashSet::new(), &base()).unwrap();

        assert_eq!(partial.elan_id, "42");
        assert!(partial.title.is_none());
        assert!(partial.url.is_none());
        assert!(partial.price.is_none());
        assert!(partial.date_posted.is_none());
    }

    #[test]
    fn test_title_falls_back_to_link_text() {
        let document = card_html(
            r#"<span>Elan № 9</span><h2><a href="/elan/9.html">Sadə başlıq</a></h2>"#,
        );
        let partial = extract_card(first_card(&document), &HashSet::new(), &base()).unwrap();
        assert_eq!(partial.title.as_deref(), Some("Sadə başlıq"));
    }

    #[test]
    fn test_absolute_detail_url_kept_as_is() {
        let document = card_html(
            r#"<span>Elan № 9</span><h2><a href="https://other.example/x.html">T</a></h2>"#,
        );
        let partial = extract_card(first_card(&document), &HashSet::new(), &base()).unwrap();
        assert_eq!(partial.url.as_deref(), Some("https://other.example/x.html"));
    }

    #[test]
    fn test_extract_cards_filters_duplicates_and_non_listings() {
        let page = Html::parse_document(
            r#"<html><body>
                <div class="block_one_synopsis_advert"><span>Elan № 1</span></div>
                <div class="block_one_synopsis_advert"><span>Elan № 2</span></div>
                <div class="block_one_synopsis_advert"><span>no marker here</span></div>
            </body></html>"#,
        );
        let seen: HashSet<String> = ["2".to_string()].into_iter().collect();

        let partials = extract_cards(&page, &seen, &base());
        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].elan_id, "1");
    }

    #[test]
    fn test_price_strips_grouping_spaces() {
        let document = card_html(
            "<span>Elan № 5</span><span class=\"value_cost_adv\">1\u{a0}250 000</span>",
        );
        let partial = extract_card(first_card(&document), &HashSet::new(), &base()).unwrap();
        assert_eq!(partial.price.as_deref(), Some("1250000"));
    }
}
