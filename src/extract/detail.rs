//! Detail extraction: detail page + partial record → full record
//!
//! Enrichment merges the detail page's attribute table into the record
//! through a fixed label→field mapping; the labeled table is authoritative
//! for every field it names. Labels outside the mapping are retained
//! verbatim in the catch-all `all_properties` map. Nothing here fails:
//! every missing field falls back to whatever the partial already carried.

use crate::extract::numeric::{parse_area, parse_room_count};
use crate::extract::summary::{clean_text, non_empty, select_first, select_text};
use crate::record::{ListingRecord, PartialRecord};
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Marker text of the view-count row in the listing history block.
const VIEW_COUNT_MARKER: &str = "Baxış sayı";

/// Advertiser-type markers as they appear on detail pages.
const ADVERTISER_MARKERS: [&str; 2] = ["ƏMLAK", "Vasitəçi"];

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// Enriches a summary-stage partial with everything the detail page supplies
/// and stamps the harvest timestamp.
pub fn enrich(
    document: &Html,
    partial: PartialRecord,
    base: &Url,
    scraped_at: DateTime<Utc>,
) -> ListingRecord {
    let mut record = ListingRecord::from_partial(partial);
    let root = document.root_element();

    // Full description wins over the card teaser carried in the partial
    if let Some(description) = select_text(root, "td[itemprop='description']") {
        record.description = description;
    }

    let leftover = apply_attribute_table(&mut record, root);
    if !leftover.is_empty() {
        let mut map = serde_json::Map::new();
        for (key, value) in leftover {
            map.insert(key, serde_json::Value::String(value));
        }
        record.all_properties =
            serde_json::to_string(&map).unwrap_or_default();
    }

    if let Some(advertiser) = find_advertiser_type(root) {
        record.advertiser_type = advertiser;
    }
    if let Some(name) = contact_name(root) {
        record.contact_name = name;
    }
    if let Some(phone) = phone_cell(root) {
        record.phone = phone;
    }
    if let Some(views) = view_count(root) {
        record.view_count = views;
    }

    record.images = image_urls(root, base).join("|");
    record.scraped_at = scraped_at.to_rfc3339();

    record
}

/// Walks every two-cell table row, routing mapped labels into record fields
/// and returning the unmapped pairs for the catch-all map.
fn apply_attribute_table(
    record: &mut ListingRecord,
    root: ElementRef<'_>,
) -> Vec<(String, String)> {
    let mut leftover = Vec::new();

    let Ok(row_selector) = Selector::parse("tr") else {
        return leftover;
    };
    let Ok(cell_selector) = Selector::parse("td") else {
        return leftover;
    };

    for row in root.select(&row_selector) {
        let cells: Vec<_> = row.select(&cell_selector).collect();
        if cells.len() != 2 {
            continue;
        }

        let key = clean_text(cells[0]);
        let value = clean_text(cells[1]);
        if key.is_empty() || value.is_empty() {
            continue;
        }

        match key.as_str() {
            "Şəhər/ərazi" => record.region = value,
            "Metro" => record.metro = value,
            "Elan növü" => record.elan_type = value,
            "Əmlak növü" => record.property_type = value,
            "Kirayə müddəti" => record.rental_period = value,
            "Otaq sayı" => record.room_count = parse_room_count(&value).unwrap_or_default(),
            "Mərtəbə" => record.floor = value,
            "Mərtəbəli bina" => record.total_floors = value,
            "Sahəsi (m²)" => record.area_sqm = parse_area(&value).unwrap_or_default(),
            "Təmiri" => record.repair_status = value,
            "Ümumi-sahə (sot)" => record.land_area_sot = value,
            "Evin-sahəsi (m²)" => record.house_area_sqm = parse_area(&value).unwrap_or_default(),
            _ => leftover.push((key, value)),
        }
    }

    leftover
}

fn find_advertiser_type(root: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("span").ok()?;
    root.select(&selector)
        .map(clean_text)
        .find(|text| ADVERTISER_MARKERS.iter().any(|marker| text.contains(marker)))
}

/// The contact cell stacks the name above secondary lines; only the first
/// non-empty line is the name.
fn contact_name(root: ElementRef<'_>) -> Option<String> {
    let cell = select_first(root, "td.name_adder")?;
    let raw: String = cell.text().collect();
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from)
}

/// The phone number lives in the cell following the labeled phone cell.
fn phone_cell(root: ElementRef<'_>) -> Option<String> {
    let label = select_first(root, "td.td_name_param_phone")?;
    label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")
        .map(clean_text)
        .and_then(non_empty)
}

fn view_count(root: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("td.history").ok()?;
    root.select(&selector)
        .map(clean_text)
        .find(|text| text.contains(VIEW_COUNT_MARKER))
        .and_then(|text| digits_re().find(&text).map(|m| m.as_str().to_string()))
}

/// Full-resolution image links, resolved against the site base.
fn image_urls(root: ElementRef<'_>, base: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a.fancybox-buttons") else {
        return Vec::new();
    };

    root.select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}
