//! OpenBD API response types.
//!
//! A record is kept as raw JSON everywhere it is stored or passed around.
//! The structs below are a tolerant view over it: every field is optional,
//! a field with an unexpected shape deserializes to its default instead of
//! failing the whole document, and ONIX composites that may be either a
//! single object or a list are accepted in both forms.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Raw OpenBD record as returned by `/get` and stored in the cache
pub type Record = Value;

/// ProductIDType code for ISBN-13
pub const PRODUCT_ID_ISBN13: &str = "15";
/// SubjectSchemeIdentifier code for the Japanese C-code
pub const SUBJECT_SCHEME_CCODE: &str = "79";
/// ContributorRole code for "by (author)"
pub const CONTRIBUTOR_AUTHOR: &str = "A01";
/// TextType code for the description
pub const TEXT_TYPE_DESCRIPTION: &str = "03";
/// PublishingDateRole code for the publication date
pub const DATE_ROLE_PUBLICATION: &str = "01";

/// Returns false for the `null` placeholders and empty documents the API
/// hands back for unknown identifiers.
pub fn is_present(record: &Record) -> bool {
    match record {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Deserialize a field, falling back to its default when the shape is wrong.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// An ONIX composite that appears either alone or as a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::Many(items) => items.iter(),
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }
}

/// Text node: either a plain string, a number, or `{"content": ...}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Plain(String),
    Number(serde_json::Number),
    Tagged { content: String },
}

impl TextValue {
    pub fn text(&self) -> String {
        match self {
            TextValue::Plain(s) => s.trim().to_string(),
            TextValue::Number(n) => n.to_string(),
            TextValue::Tagged { content } => content.trim().to_string(),
        }
    }
}

/// Text of an optional node, empty when absent
pub fn text_of(value: &Option<TextValue>) -> String {
    value.as_ref().map(TextValue::text).unwrap_or_default()
}

/// Tolerant view over one OpenBD record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenBdRecord {
    #[serde(deserialize_with = "lenient")]
    pub summary: Summary,
    #[serde(deserialize_with = "lenient")]
    pub onix: Onix,
}

impl OpenBdRecord {
    /// Parse a raw record. Never fails; unreadable parts are left empty.
    pub fn parse(record: &Record) -> Self {
        Self::deserialize(record).unwrap_or_default()
    }
}

/// OpenBD's flattened summary block
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Summary {
    #[serde(deserialize_with = "lenient")]
    pub isbn: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub publisher: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub pubdate: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub author: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Onix {
    #[serde(deserialize_with = "lenient")]
    pub record_reference: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub product_identifier: OneOrMany<ProductIdentifier>,
    #[serde(deserialize_with = "lenient")]
    pub descriptive_detail: DescriptiveDetail,
    #[serde(deserialize_with = "lenient")]
    pub collateral_detail: CollateralDetail,
    #[serde(deserialize_with = "lenient")]
    pub publishing_detail: PublishingDetail,
    #[serde(deserialize_with = "lenient")]
    pub product_supply: ProductSupply,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductIdentifier {
    #[serde(rename = "ProductIDType", deserialize_with = "lenient")]
    pub product_id_type: Option<TextValue>,
    #[serde(rename = "IDValue", deserialize_with = "lenient")]
    pub id_value: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DescriptiveDetail {
    #[serde(deserialize_with = "lenient")]
    pub title_detail: TitleDetail,
    #[serde(deserialize_with = "lenient")]
    pub contributor: OneOrMany<Contributor>,
    #[serde(deserialize_with = "lenient")]
    pub subject: OneOrMany<Subject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TitleDetail {
    #[serde(deserialize_with = "lenient")]
    pub title_element: OneOrMany<TitleElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TitleElement {
    #[serde(deserialize_with = "lenient")]
    pub title_text: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub subtitle: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Contributor {
    #[serde(deserialize_with = "lenient")]
    pub person_name: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub contributor_role: OneOrMany<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Subject {
    #[serde(deserialize_with = "lenient")]
    pub subject_scheme_identifier: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub subject_code: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CollateralDetail {
    #[serde(deserialize_with = "lenient")]
    pub text_content: OneOrMany<TextContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TextContent {
    #[serde(deserialize_with = "lenient")]
    pub text_type: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub text: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PublishingDetail {
    #[serde(deserialize_with = "lenient")]
    pub imprint: Imprint,
    #[serde(deserialize_with = "lenient")]
    pub publisher: Publisher,
    #[serde(deserialize_with = "lenient")]
    pub publishing_date: OneOrMany<PublishingDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Imprint {
    #[serde(deserialize_with = "lenient")]
    pub imprint_name: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Publisher {
    #[serde(deserialize_with = "lenient")]
    pub publisher_name: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PublishingDate {
    #[serde(deserialize_with = "lenient")]
    pub publishing_date_role: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    pub date: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ProductSupply {
    #[serde(deserialize_with = "lenient")]
    pub supply_detail: OneOrMany<SupplyDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SupplyDetail {
    #[serde(deserialize_with = "lenient")]
    pub price: OneOrMany<Price>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Price {
    #[serde(deserialize_with = "lenient")]
    pub price_amount: Option<TextValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_present() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!({})));
        assert!(is_present(&json!({"summary": {"isbn": "9784000000001"}})));
    }

    #[test]
    fn test_one_or_many_accepts_both_shapes() {
        let single = OpenBdRecord::parse(&json!({
            "onix": {"ProductIdentifier": {"ProductIDType": "15", "IDValue": "9784000000001"}}
        }));
        assert_eq!(single.onix.product_identifier.iter().count(), 1);

        let list = OpenBdRecord::parse(&json!({
            "onix": {"ProductIdentifier": [
                {"ProductIDType": "03", "IDValue": "x"},
                {"ProductIDType": "15", "IDValue": "9784000000001"}
            ]}
        }));
        assert_eq!(list.onix.product_identifier.iter().count(), 2);
    }

    #[test]
    fn test_wrong_shape_falls_back_to_default() {
        let record = OpenBdRecord::parse(&json!({
            "summary": {"isbn": "9784000000001", "title": ["unexpected"]},
            "onix": {"DescriptiveDetail": "garbage"}
        }));
        assert_eq!(text_of(&record.summary.isbn), "9784000000001");
        assert!(record.summary.title.is_none());
        assert_eq!(record.onix.descriptive_detail.subject.iter().count(), 0);
    }

    #[test]
    fn test_text_value_shapes() {
        let record = OpenBdRecord::parse(&json!({
            "onix": {
                "DescriptiveDetail": {
                    "TitleDetail": {"TitleElement": {"TitleText": {"collationkey": "ニホン", "content": "日本"}}}
                },
                "ProductSupply": {"SupplyDetail": {"Price": [{"PriceAmount": 880}]}}
            }
        }));
        let title = record.onix.descriptive_detail.title_detail.title_element.first().cloned();
        assert_eq!(text_of(&title.and_then(|t| t.title_text)), "日本");

        let price = record
            .onix
            .product_supply
            .supply_detail
            .first()
            .and_then(|s| s.price.first())
            .map(|p| text_of(&p.price_amount));
        assert_eq!(price.as_deref(), Some("880"));
    }

    #[test]
    fn test_non_object_record_parses_to_default() {
        let record = OpenBdRecord::parse(&json!("not a record"));
        assert!(record.summary.isbn.is_none());
    }
}
