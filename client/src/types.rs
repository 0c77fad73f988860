use serde::{Deserialize, Serialize};

/// Processing state of an uploaded document.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Ready,
    Failed,
}

/// Catalog entry for an uploaded document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub status: DocumentStatus,
    pub uploaded_at: String,
    pub page_count: Option<u32>,
}

/// Receipt returned by the upload endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct UploadReceipt {
    pub id: String,
    pub filename: String,
    pub status: DocumentStatus,
}

/// One field extracted from a document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ExtractedField {
    pub name: String,
    pub value: String,
    pub confidence: f64,
    pub page: Option<u32>,
}

/// Extraction result for one document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AnalysisReport {
    pub document_id: String,
    pub summary: String,
    pub fields: Vec<ExtractedField>,
}

/// Operator-supplied replacement value for an extracted field.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FieldCorrection {
    pub name: String,
    pub value: String,
}

/// Source excerpt backing part of an answer.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Citation {
    pub document_id: String,
    pub page: Option<u32>,
    pub excerpt: String,
}

/// Answer to a retrieval-augmented query.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct QueryAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_status_uses_snake_case() {
        let summary: DocumentSummary = serde_json::from_str(
            r#"{
                "id": "doc-1",
                "filename": "invoice.pdf",
                "status": "processing",
                "uploaded_at": "2024-05-01T10:00:00Z",
                "page_count": 4
            }"#,
        )
        .unwrap();

        assert_eq!(summary.status, DocumentStatus::Processing);
        assert_eq!(summary.page_count, Some(4));
    }

    #[test]
    fn report_round_trips_optional_pages() {
        let report: AnalysisReport = serde_json::from_str(
            r#"{
                "document_id": "doc-1",
                "summary": "Invoice from ACME",
                "fields": [
                    {"name": "total", "value": "81.50", "confidence": 0.92, "page": 1},
                    {"name": "vendor", "value": "ACME", "confidence": 0.88, "page": null}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(report.fields.len(), 2);
        assert_eq!(report.fields[1].page, None);
    }
}
