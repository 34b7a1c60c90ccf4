//! Listing record types and the stable output schema
//!
//! The column order defined here is the contract with the downstream reporting
//! stage, which indexes the CSV by column name. Append new columns at the end;
//! never reorder or rename existing ones.

use serde::Serialize;

/// CSV column order for [`ListingRecord`], written as the header row.
pub const CSV_COLUMNS: [&str; 29] = [
    "elan_id",
    "title",
    "url",
    "price",
    "currency",
    "location",
    "region",
    "metro",
    "category",
    "subcategory",
    "elan_type",
    "property_type",
    "rental_period",
    "room_count",
    "floor",
    "total_floors",
    "area_sqm",
    "repair_status",
    "land_area_sot",
    "house_area_sqm",
    "advertiser_type",
    "description",
    "contact_name",
    "phone",
    "date_posted",
    "view_count",
    "images",
    "all_properties",
    "scraped_at",
];

/// A fully extracted listing, one row of output.
///
/// All fields are raw strings as harvested from the markup; a field whose
/// source markup was absent or unparseable is left empty. `elan_id` is the
/// only field guaranteed non-empty and is the de-duplication key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingRecord {
    /// Site-assigned stable listing identifier
    pub elan_id: String,
    pub title: String,
    /// Canonical detail-page URL (absolute)
    pub url: String,
    /// Raw price amount with separators stripped
    pub price: String,
    pub currency: String,
    pub location: String,
    pub region: String,
    pub metro: String,
    pub category: String,
    pub subcategory: String,
    pub elan_type: String,
    pub property_type: String,
    pub rental_period: String,
    pub room_count: String,
    pub floor: String,
    pub total_floors: String,
    pub area_sqm: String,
    pub repair_status: String,
    pub land_area_sot: String,
    pub house_area_sqm: String,
    pub advertiser_type: String,
    pub description: String,
    pub contact_name: String,
    pub phone: String,
    pub date_posted: String,
    pub view_count: String,
    /// Pipe-delimited list of absolute image URLs
    pub images: String,
    /// Catch-all attribute-table pairs, serialized as JSON
    pub all_properties: String,
    /// Harvest timestamp, RFC 3339 UTC
    pub scraped_at: String,
}

impl ListingRecord {
    /// Seeds a record from a summary-stage partial. Detail extraction fills
    /// the rest.
    pub fn from_partial(partial: PartialRecord) -> Self {
        Self {
            elan_id: partial.elan_id,
            title: partial.title.unwrap_or_default(),
            url: partial.url.unwrap_or_default(),
            price: partial.price.unwrap_or_default(),
            currency: partial.currency.unwrap_or_default(),
            location: partial.location.unwrap_or_default(),
            category: partial.category.unwrap_or_default(),
            subcategory: partial.subcategory.unwrap_or_default(),
            description: partial.short_description.unwrap_or_default(),
            date_posted: partial.date_posted.unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Returns the record's fields in [`CSV_COLUMNS`] order.
    pub fn as_row(&self) -> [&str; 29] {
        [
            &self.elan_id,
            &self.title,
            &self.url,
            &self.price,
            &self.currency,
            &self.location,
            &self.region,
            &self.metro,
            &self.category,
            &self.subcategory,
            &self.elan_type,
            &self.property_type,
            &self.rental_period,
            &self.room_count,
            &self.floor,
            &self.total_floors,
            &self.area_sqm,
            &self.repair_status,
            &self.land_area_sot,
            &self.house_area_sqm,
            &self.advertiser_type,
            &self.description,
            &self.contact_name,
            &self.phone,
            &self.date_posted,
            &self.view_count,
            &self.images,
            &self.all_properties,
            &self.scraped_at,
        ]
    }
}

/// Output of the summary extraction stage: what a listing card alone can
/// supply. Everything but the identifier is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub elan_id: String,
    pub title: Option<String>,
    /// Absolute detail-page URL, resolved against the site base
    pub url: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Card teaser text; used as a description fallback when the detail page
    /// carries none
    pub short_description: Option<String>,
    pub date_posted: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_matches_column_count() {
        let record = ListingRecord::default();
        assert_eq!(record.as_row().len(), CSV_COLUMNS.len());
    }

    #[test]
    fn test_from_partial_carries_summary_fields() {
        let partial = PartialRecord {
            elan_id: "12345".to_string(),
            title: Some("3 otaqlı mənzil".to_string()),
            url: Some("https://example.com/elan/12345.html".to_string()),
            price: Some("85000".to_string()),
            currency: Some("AZN".to_string()),
            short_description: Some("Təcili satılır".to_string()),
            ..Default::default()
        };

        let record = ListingRecord::from_partial(partial);
        assert_eq!(record.elan_id, "12345");
        assert_eq!(record.title, "3 otaqlı mənzil");
        assert_eq!(record.price, "85000");
        assert_eq!(record.description, "Təcili satılır");
        assert_eq!(record.region, "");
        assert_eq!(record.scraped_at, "");
    }

    #[test]
    fn test_from_partial_defaults_missing_fields_to_empty() {
        let partial = PartialRecord {
            elan_id: "7".to_string(),
            ..Default::default()
        };

        let record = ListingRecord::from_partial(partial);
        assert_eq!(record.elan_id, "7");
        assert!(record.as_row()[1..].iter().all(|f| f.is_empty()));
    }
}
