//! Field extraction from raw OpenBD records.
//!
//! Every lookup into the record's structure lives here. Absent fields are
//! ordinary empty values, never errors.

use crate::api::types::{
    text_of, OpenBdRecord, CONTRIBUTOR_AUTHOR, DATE_ROLE_PUBLICATION, PRODUCT_ID_ISBN13,
    SUBJECT_SCHEME_CCODE, TEXT_TYPE_DESCRIPTION,
};
use crate::api::{is_present, Record};
use shared::BookInfo;

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// First ProductIdentifier of type ISBN-13
fn isbn13(parsed: &OpenBdRecord) -> Option<String> {
    parsed
        .onix
        .product_identifier
        .iter()
        .find(|pid| text_of(&pid.product_id_type) == PRODUCT_ID_ISBN13)
        .and_then(|pid| non_empty(text_of(&pid.id_value)))
}

/// Identifier a record should be cached under.
///
/// Tries `summary.isbn`, then `onix.RecordReference`, then the ISBN-13
/// product identifier.
pub fn canonical_identifier(record: &Record) -> Option<String> {
    let parsed = OpenBdRecord::parse(record);

    non_empty(text_of(&parsed.summary.isbn))
        .or_else(|| non_empty(text_of(&parsed.onix.record_reference)))
        .or_else(|| isbn13(&parsed))
}

/// Whether the record carries a C-code starting with `prefix`
pub fn is_genre(record: &Record, prefix: &str) -> bool {
    if !is_present(record) {
        return false;
    }

    OpenBdRecord::parse(record)
        .onix
        .descriptive_detail
        .subject
        .iter()
        .any(|subject| {
            text_of(&subject.subject_scheme_identifier) == SUBJECT_SCHEME_CCODE
                && text_of(&subject.subject_code).starts_with(prefix)
        })
}

/// Normalize a record into the fields the feed needs.
///
/// Returns `None` only for null or empty records.
pub fn extract_book_info(record: &Record) -> Option<BookInfo> {
    if !is_present(record) {
        return None;
    }

    let parsed = OpenBdRecord::parse(record);
    let summary = &parsed.summary;
    let onix = &parsed.onix;
    let descriptive = &onix.descriptive_detail;
    let publishing = &onix.publishing_detail;

    let title_element = descriptive.title_detail.title_element.first();
    let title = title_element
        .and_then(|t| non_empty(text_of(&t.title_text)))
        .unwrap_or_else(|| text_of(&summary.title));
    let subtitle = title_element
        .map(|t| text_of(&t.subtitle))
        .unwrap_or_default();

    let authors = descriptive
        .contributor
        .iter()
        .filter(|c| c.contributor_role.iter().any(|role| role == CONTRIBUTOR_AUTHOR))
        .filter_map(|c| non_empty(text_of(&c.person_name)))
        .collect();

    let description = onix
        .collateral_detail
        .text_content
        .iter()
        .find(|t| text_of(&t.text_type) == TEXT_TYPE_DESCRIPTION)
        .map(|t| text_of(&t.text))
        .unwrap_or_default();

    let publisher = non_empty(text_of(&publishing.imprint.imprint_name))
        .or_else(|| non_empty(text_of(&publishing.publisher.publisher_name)))
        .unwrap_or_else(|| text_of(&summary.publisher));

    let publish_date = publishing
        .publishing_date
        .iter()
        .find(|d| text_of(&d.publishing_date_role) == DATE_ROLE_PUBLICATION)
        .and_then(|d| non_empty(text_of(&d.date)))
        .unwrap_or_else(|| text_of(&summary.pubdate));

    let price = onix
        .product_supply
        .supply_detail
        .first()
        .and_then(|supply| supply.price.first())
        .map(|p| text_of(&p.price_amount))
        .unwrap_or_default();

    let isbn = isbn13(&parsed)
        .or_else(|| non_empty(text_of(&onix.record_reference)))
        .or_else(|| non_empty(text_of(&summary.isbn)))
        .unwrap_or_default();

    Some(BookInfo {
        isbn,
        title,
        subtitle,
        authors,
        description,
        publisher,
        publish_date,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> Record {
        json!({
            "summary": {
                "isbn": "9784000000001",
                "title": "要約タイトル",
                "publisher": "要約出版社",
                "pubdate": "20240401"
            },
            "onix": {
                "RecordReference": "9784000000001",
                "ProductIdentifier": {"ProductIDType": "15", "IDValue": "9784000000001"},
                "DescriptiveDetail": {
                    "TitleDetail": {
                        "TitleType": "01",
                        "TitleElement": {
                            "TitleElementLevel": "01",
                            "TitleText": {"collationkey": "ニホンゴノレキシ", "content": "日本語の歴史"},
                            "Subtitle": {"content": "古代から現代まで"}
                        }
                    },
                    "Contributor": [
                        {"PersonName": {"content": "山田 太郎"}, "ContributorRole": ["A01"]},
                        {"PersonName": {"content": "佐藤 花子"}, "ContributorRole": ["B06"]},
                        {"PersonName": "鈴木 一郎", "ContributorRole": "A01"}
                    ],
                    "Subject": [
                        {"SubjectSchemeIdentifier": "78", "SubjectCode": "30"},
                        {"SubjectSchemeIdentifier": "79", "SubjectCode": "0281"}
                    ]
                },
                "CollateralDetail": {
                    "TextContent": [
                        {"TextType": "02", "Text": "短い紹介"},
                        {"TextType": "03", "Text": "詳しい内容紹介"}
                    ]
                },
                "PublishingDetail": {
                    "Imprint": {"ImprintName": "テスト新書"},
                    "Publisher": {"PublisherName": "テスト出版"},
                    "PublishingDate": [
                        {"PublishingDateRole": "01", "Date": "20240410"}
                    ]
                },
                "ProductSupply": {
                    "SupplyDetail": {
                        "ReturnsConditions": {},
                        "Price": [{"PriceType": "03", "PriceAmount": "990", "CurrencyCode": "JPY"}]
                    }
                }
            }
        })
    }

    #[test]
    fn test_canonical_identifier_prefers_summary() {
        let record = json!({
            "summary": {"isbn": "9784000000001"},
            "onix": {"RecordReference": "9784000000999"}
        });
        assert_eq!(canonical_identifier(&record).as_deref(), Some("9784000000001"));
    }

    #[test]
    fn test_canonical_identifier_falls_back_to_record_reference() {
        let record = json!({"summary": {"isbn": ""}, "onix": {"RecordReference": "9784000000002"}});
        assert_eq!(canonical_identifier(&record).as_deref(), Some("9784000000002"));
    }

    #[test]
    fn test_canonical_identifier_scans_product_identifiers() {
        let record = json!({"onix": {"ProductIdentifier": [
            {"ProductIDType": "03", "IDValue": "4900000000000"},
            {"ProductIDType": "15", "IDValue": "9784000000003"}
        ]}});
        assert_eq!(canonical_identifier(&record).as_deref(), Some("9784000000003"));
    }

    #[test]
    fn test_canonical_identifier_absent() {
        assert_eq!(canonical_identifier(&json!({"summary": {}})), None);
        assert_eq!(canonical_identifier(&Record::Null), None);
    }

    #[test]
    fn test_is_genre() {
        let record = full_record();
        assert!(is_genre(&record, "02"));
        assert!(is_genre(&record, "0281"));
        assert!(!is_genre(&record, "01"));
        // Scheme 78 codes are not C-codes
        assert!(!is_genre(&record, "30"));
        assert!(!is_genre(&Record::Null, "02"));
    }

    #[test]
    fn test_extract_full_record() {
        let book = extract_book_info(&full_record()).unwrap();
        assert_eq!(book.isbn, "9784000000001");
        assert_eq!(book.title, "日本語の歴史");
        assert_eq!(book.subtitle, "古代から現代まで");
        assert_eq!(book.authors, vec!["山田 太郎", "鈴木 一郎"]);
        assert_eq!(book.description, "詳しい内容紹介");
        assert_eq!(book.publisher, "テスト新書");
        assert_eq!(book.publish_date, "20240410");
        assert_eq!(book.price, "990");
    }

    #[test]
    fn test_extract_falls_back_to_summary() {
        let record = json!({
            "summary": {
                "isbn": "9784000000004",
                "title": "要約だけの本",
                "publisher": "要約出版社",
                "pubdate": "2024-05"
            }
        });
        let book = extract_book_info(&record).unwrap();
        assert_eq!(book.isbn, "9784000000004");
        assert_eq!(book.title, "要約だけの本");
        assert_eq!(book.publisher, "要約出版社");
        assert_eq!(book.publish_date, "2024-05");
        assert!(book.authors.is_empty());
        assert_eq!(book.price, "");
    }

    #[test]
    fn test_extract_publisher_without_imprint() {
        let record = json!({"onix": {"PublishingDetail": {"Publisher": {"PublisherName": "版元"}}}});
        assert_eq!(extract_book_info(&record).unwrap().publisher, "版元");
    }

    #[test]
    fn test_extract_null_record() {
        assert_eq!(extract_book_info(&Record::Null), None);
        assert_eq!(extract_book_info(&json!({})), None);
    }
}
