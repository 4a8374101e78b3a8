//! Property tests for filename identifier extraction.

use pdf_barcode_stamper::identifier::{extract, IdentifierExtractor};
use pdf_barcode_stamper::writer::barcode::validate_payload;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_concatenates_every_digit_in_order(name in "\\PC{0,40}") {
        let expected: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
        match extract(&name) {
            Some(identifier) => prop_assert_eq!(identifier.as_str(), expected.as_str()),
            None => prop_assert!(expected.is_empty()),
        }
    }

    #[test]
    fn prop_extraction_is_deterministic(name in "[a-z0-9_ .-]{0,30}") {
        let extractor = IdentifierExtractor::new();
        prop_assert_eq!(extractor.extract(&name), extractor.extract(&name));
    }

    #[test]
    fn prop_identifiers_are_valid_barcode_payloads(stem in "[a-z_-]{0,5}[0-9]{1,12}[a-z_-]{0,5}") {
        let name = format!("{}.pdf", stem);
        let identifier = extract(&name).unwrap();
        prop_assert!(!identifier.as_str().is_empty());
        prop_assert!(validate_payload(identifier.as_str()).is_ok());
    }
}
