use crate::errors::{ClientError, Result};
use session::store::ANONYMOUS_SESSION;
use std::fmt;

/// Identity of one logical analysis request: a document as seen by one
/// session. Callers holding equal keys observe the same in-flight outcome.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    /// Key for an analysis of `document_id` under `session_id`, falling back
    /// to the anonymous session when no identifier is known.
    pub fn for_document(document_id: &str, session_id: Option<&str>) -> Result<Self> {
        if document_id.is_empty() {
            return Err(ClientError::InvalidArgument(
                "empty document id".to_string(),
            ));
        }

        let session = session_id.unwrap_or(ANONYMOUS_SESSION);
        Ok(RequestKey(format!("{document_id}|{session}")))
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
