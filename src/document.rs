//! Wire types for registry document submissions.

use serde::{Deserialize, Serialize};

/// A goods-introduction document as the registry expects it.
///
/// Field names follow the registry's JSON schema, which is camelCase on
/// the wire. All fields are serialized; the registry treats empty strings
/// and absent values the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Free-form document description
    pub description: String,
    /// Document identifier assigned by the participant
    pub doc_id: String,
    /// Document status
    pub doc_status: String,
    /// Document type code
    pub doc_type: String,
    /// Whether the goods were imported
    pub import_request: bool,
    /// Owner's taxpayer id (INN)
    pub owner_inn: String,
    /// Participant's taxpayer id (INN)
    pub participant_inn: String,
    /// Producer's taxpayer id (INN)
    pub producer_inn: String,
    /// Production date, `yyyy-MM-dd`
    pub production_date: String,
    /// Production type code
    pub production_type: String,
    /// Products covered by the document
    pub products: Vec<Product>,
    /// Registration date, `yyyy-MM-dd`
    pub reg_date: String,
    /// Registration number
    pub reg_number: String,
}

/// A single product line within a [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Conformance certificate document type
    pub certificate_document: String,
    /// Certificate issue date, `yyyy-MM-dd`
    pub certificate_document_date: String,
    /// Certificate number
    pub certificate_document_number: String,
    /// Owner's taxpayer id (INN)
    pub owner_inn: String,
    /// Producer's taxpayer id (INN)
    pub producer_inn: String,
    /// Production date, `yyyy-MM-dd`
    pub production_date: String,
    /// Customs commodity code (TN VED)
    pub tnved_code: String,
    /// Unit identification code
    pub uit_code: String,
    /// Packaging identification code
    pub uitu_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_with_camel_case_names() {
        let document = Document {
            doc_id: "doc-1".to_string(),
            import_request: true,
            owner_inn: "7712345678".to_string(),
            products: vec![Product {
                tnved_code: "6401".to_string(),
                uit_code: "010463003407001221".to_string(),
                ..Product::default()
            }],
            ..Document::default()
        };

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["docId"], "doc-1");
        assert_eq!(json["importRequest"], true);
        assert_eq!(json["ownerInn"], "7712345678");
        assert_eq!(json["products"][0]["tnvedCode"], "6401");
        assert_eq!(json["products"][0]["uitCode"], "010463003407001221");
        // Rust field names never leak onto the wire.
        assert!(json.get("doc_id").is_none());
        assert!(json["products"][0].get("uit_code").is_none());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let document = Document {
            doc_id: "doc-2".to_string(),
            doc_status: "DRAFT".to_string(),
            doc_type: "LP_INTRODUCE_GOODS".to_string(),
            products: vec![Product::default()],
            ..Document::default()
        };

        let json = serde_json::to_string(&document).unwrap();
        let parsed: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, document);
    }
}
