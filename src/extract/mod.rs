//! Extraction pipeline: semi-structured markup → typed records
//!
//! Two independent, pure stages over `scraper` parse trees:
//! - summary extraction turns one listing card into a [`PartialRecord`]
//! - detail extraction enriches a partial into a full [`ListingRecord`]
//!
//! Neither stage performs I/O, and neither stage fails: a missing field is an
//! omitted field, never an error.
//!
//! [`PartialRecord`]: crate::record::PartialRecord
//! [`ListingRecord`]: crate::record::ListingRecord

mod detail;
mod numeric;
mod summary;

pub use detail::enrich;
pub use numeric::{parse_area, parse_decimal, parse_room_count};
pub use summary::{extract_card, extract_cards, find_listing_id, CARD_SELECTOR};
