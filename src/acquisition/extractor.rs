// src/acquisition/extractor.rs
use regex::Regex;
use tracing::debug;

use crate::acquisition::types::{canonical_key, AcquireError, EntryHandle};
use crate::driver::{EntryField, SurfaceDriver};
use crate::models::BusinessRecord;

/// Turns one entry handle into a best-effort record.
///
/// Every field is read independently: a missing or unparsable field becomes
/// `None`, it never sinks the record. The two exceptions are the identity
/// key (no map URL, no record) and a handle that went stale under us, which
/// the engine retries once.
pub struct FieldExtractor<'a> {
    driver: &'a dyn SurfaceDriver,
    number_re: Regex,
    paren_count_re: Regex,
    word_count_re: Regex,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(driver: &'a dyn SurfaceDriver) -> Self {
        Self {
            driver,
            number_re: Regex::new(r"[0-9][0-9.,\u{202f}\s]*").unwrap(),
            paren_count_re: Regex::new(r"\(([0-9][0-9.,\u{202f}\s]*)\)").unwrap(),
            word_count_re: Regex::new(r"([0-9][0-9.,\u{202f}\s]*)\s*[Rr]eview").unwrap(),
        }
    }

    pub async fn extract(&self, handle: &EntryHandle) -> Result<BusinessRecord, AcquireError> {
        // Identity first: without a map URL there is nothing to key on.
        let map_url = match self.driver.read_attribute(handle, EntryField::MapUrl).await? {
            Some(raw) => canonical_key(&raw).ok_or(AcquireError::NoIdentity)?,
            None => return Err(AcquireError::NoIdentity),
        };

        let mut record = BusinessRecord::with_map_url(map_url);
        record.name = self.read_field(handle, EntryField::Name).await?;
        record.address = self.read_field(handle, EntryField::Address).await?;
        record.phone = self.read_field(handle, EntryField::Phone).await?;
        record.website = self.read_field(handle, EntryField::Website).await?;
        record.category = self.read_field(handle, EntryField::Category).await?;

        if let Some(summary) = self.read_field(handle, EntryField::RatingSummary).await? {
            record.rating = self.parse_rating(&summary);
            record.review_count = self.parse_review_count(&summary);
            if record.rating.is_none() {
                debug!("Unparsable rating summary for {}: {:?}", handle.key, summary);
            }
        }

        Ok(record)
    }

    /// One attribute, trimmed, with empty strings collapsed to `None`.
    async fn read_field(
        &self,
        handle: &EntryHandle,
        field: EntryField,
    ) -> Result<Option<String>, AcquireError> {
        let value = self.driver.read_attribute(handle, field).await?;
        Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    }

    /// Leading number of the summary, read as a locale-tolerant decimal and
    /// range-checked. "4.5 stars…" and "4,5 étoiles…" both yield 4.5; a
    /// grouped integer like "1,234" falls out of range and becomes `None`.
    fn parse_rating(&self, summary: &str) -> Option<f64> {
        let m = self.number_re.find(summary)?;
        let value = parse_locale_number(m.as_str())?;
        (0.0..=5.0).contains(&value).then_some(value)
    }

    /// Review count from "(1,234)" or "1,234 Reviews" style text. All
    /// grouping characters are stripped before parsing.
    fn parse_review_count(&self, summary: &str) -> Option<u64> {
        let captured = self
            .paren_count_re
            .captures(summary)
            .or_else(|| self.word_count_re.captures(summary))?;
        let digits: String = captured[1].chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

/// Parse a number that may use either `.` or `,` as the decimal separator,
/// or as a digit-grouping separator ("1,234", "1.234", "1 234"). A
/// separator followed by exactly three digits is treated as grouping.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{202f}')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let separators: Vec<usize> = cleaned
        .char_indices()
        .filter(|(_, c)| *c == '.' || *c == ',')
        .map(|(i, _)| i)
        .collect();

    match separators.as_slice() {
        [] => cleaned.parse().ok(),
        [i] => {
            let decimals = cleaned.len() - i - 1;
            if decimals == 3 {
                // grouped integer
                let digits: String = cleaned.chars().filter(char::is_ascii_digit).collect();
                digits.parse().ok()
            } else {
                cleaned.replace(',', ".").parse().ok()
            }
        }
        _ => {
            // multiple separators: the last one is the decimal point iff it
            // isn't followed by exactly three digits ("1.234.567" vs
            // "1,234.5")
            let last = *separators.last().unwrap();
            let decimals = cleaned.len() - last - 1;
            let digits_before: String = cleaned[..last]
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            if decimals == 3 {
                let digits_after: String = cleaned[last..]
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                format!("{digits_before}{digits_after}").parse().ok()
            } else {
                format!("{digits_before}.{}", &cleaned[last + 1..]).parse().ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::testing::ScriptedDriver;

    fn handle(href: &str) -> EntryHandle {
        EntryHandle::from_href(href).unwrap()
    }

    #[test]
    fn locale_numbers_parse_both_separator_conventions() {
        assert_eq!(parse_locale_number("4.5"), Some(4.5));
        assert_eq!(parse_locale_number("4,5"), Some(4.5));
        assert_eq!(parse_locale_number("5"), Some(5.0));
        assert_eq!(parse_locale_number("1,234"), Some(1234.0));
        assert_eq!(parse_locale_number("1.234"), Some(1234.0));
        assert_eq!(parse_locale_number("1 234"), Some(1234.0));
        assert_eq!(parse_locale_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_locale_number("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_locale_number(""), None);
        assert_eq!(parse_locale_number("abc"), None);
    }

    #[tokio::test]
    async fn full_card_extracts_every_field() {
        let driver = ScriptedDriver::new();
        let href = "https://www.google.com/maps/place/blue-door-cafe?hl=en";
        driver.show(&[href]);
        driver
            .set_attribute(href, EntryField::Name, "Blue Door Cafe")
            .set_attribute(href, EntryField::Address, "123 Main St, Duluth, MN")
            .set_attribute(href, EntryField::Phone, "(218) 555-0148")
            .set_attribute(href, EntryField::Website, "https://bluedoorcafe.example")
            .set_attribute(href, EntryField::Category, "Coffee shop")
            .set_attribute(href, EntryField::RatingSummary, "4.5 stars 1,234 Reviews");

        let extractor = FieldExtractor::new(&driver);
        let record = extractor.extract(&handle(href)).await.unwrap();

        assert_eq!(record.name.as_deref(), Some("Blue Door Cafe"));
        assert_eq!(record.address.as_deref(), Some("123 Main St, Duluth, MN"));
        assert_eq!(record.phone.as_deref(), Some("(218) 555-0148"));
        assert_eq!(record.website.as_deref(), Some("https://bluedoorcafe.example"));
        assert_eq!(record.category.as_deref(), Some("Coffee shop"));
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.review_count, Some(1234));
        assert_eq!(record.map_url, "https://www.google.com/maps/place/blue-door-cafe");
    }

    #[tokio::test]
    async fn map_url_only_card_still_yields_a_record() {
        let driver = ScriptedDriver::new();
        let href = "https://www.google.com/maps/place/mystery-spot";
        driver.show(&[href]);

        let extractor = FieldExtractor::new(&driver);
        let record = extractor.extract(&handle(href)).await.unwrap();

        assert_eq!(record.map_url, "https://www.google.com/maps/place/mystery-spot");
        assert!(record.name.is_none());
        assert!(record.address.is_none());
        assert!(record.phone.is_none());
        assert!(record.website.is_none());
        assert!(record.category.is_none());
        assert!(record.rating.is_none());
        assert!(record.review_count.is_none());
    }

    #[tokio::test]
    async fn missing_map_url_is_fatal_for_the_entry() {
        let driver = ScriptedDriver::new();
        let href = "https://www.google.com/maps/place/ghost";
        driver.show(&[href]);
        driver.drop_identity(href);

        let extractor = FieldExtractor::new(&driver);
        let err = extractor.extract(&handle(href)).await.unwrap_err();
        assert!(matches!(err, AcquireError::NoIdentity));
    }

    #[tokio::test]
    async fn stale_element_surfaces_as_stale_handle() {
        let driver = ScriptedDriver::new();
        let href = "https://www.google.com/maps/place/flicker";
        driver.show(&[href]);
        driver.mark_stale(href, u32::MAX);

        let extractor = FieldExtractor::new(&driver);
        let err = extractor.extract(&handle(href)).await.unwrap_err();
        assert!(matches!(err, AcquireError::StaleHandle));
    }

    #[tokio::test]
    async fn comma_decimal_rating_and_spaced_count_parse() {
        let driver = ScriptedDriver::new();
        let href = "https://www.google.com/maps/place/le-bistro";
        driver.show(&[href]);
        driver.set_attribute(href, EntryField::RatingSummary, "4,5 étoiles (1 234)");

        let extractor = FieldExtractor::new(&driver);
        let record = extractor.extract(&handle(href)).await.unwrap();
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.review_count, Some(1234));
    }

    #[tokio::test]
    async fn garbage_rating_degrades_to_none_not_error() {
        let driver = ScriptedDriver::new();
        let href = "https://www.google.com/maps/place/odd";
        driver.show(&[href]);
        driver.set_attribute(href, EntryField::RatingSummary, "New on Maps");

        let extractor = FieldExtractor::new(&driver);
        let record = extractor.extract(&handle(href)).await.unwrap();
        assert!(record.rating.is_none());
        assert!(record.review_count.is_none());
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let driver = ScriptedDriver::new();
        let href = "https://www.google.com/maps/place/overrated";
        driver.show(&[href]);
        driver.set_attribute(href, EntryField::RatingSummary, "1,234 reviews");

        let extractor = FieldExtractor::new(&driver);
        let record = extractor.extract(&handle(href)).await.unwrap();
        // "1,234" is a grouped integer, far outside [0, 5]
        assert!(record.rating.is_none());
        assert_eq!(record.review_count, Some(1234));
    }
}
