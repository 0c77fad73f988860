use crate::classify::classify_failure;
use crate::config::ClientConfig;
use crate::errors::Result;
use crate::key::RequestKey;
use crate::refresh::AuthRefresher;
use crate::registry::InflightRegistry;
use crate::retry::with_auth_retry;
use crate::types::{
    AnalysisReport, DocumentSummary, FieldCorrection, QueryAnswer, UploadReceipt,
};
use serde::Serialize;
use session::store::SessionStore;
use std::sync::Arc;
use url::Url;

#[derive(Serialize)]
struct QueryRequest {
    question: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    document_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct CorrectionsRequest<'a> {
    corrections: &'a [FieldCorrection],
}

/// Typed client for the analysis backend.
///
/// Owns the coordination core: analysis runs are deduplicated per
/// (document, session), and every operation gets one transparent retry after
/// a successful auth refresh.
#[derive(Clone)]
pub struct AnalysisService {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
    refresher: AuthRefresher,
    analyses: InflightRegistry<AnalysisReport>,
}

impl AnalysisService {
    pub fn new(
        config: &ClientConfig,
        http: reqwest::Client,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        // Url::join treats a path without a trailing slash as a file and
        // would drop its last segment.
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let refresher = AuthRefresher::new(Arc::clone(&session), config.settle_delay());
        AnalysisService {
            http,
            base_url,
            session,
            refresher,
            analyses: InflightRegistry::new(config.grace_window()),
        }
    }

    pub async fn upload_document(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReceipt> {
        let url = self.base_url.join("api/documents")?;
        let http = self.http.clone();
        let filename = filename.to_string();

        with_auth_retry(&self.refresher, || {
            let (http, url, filename, bytes) =
                (http.clone(), url.clone(), filename.clone(), bytes.clone());
            async move {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
                let form = reqwest::multipart::Form::new().part("file", part);
                let response = http.post(url).multipart(form).send().await?;
                read_json(response).await
            }
        })
        .await
    }

    /// Run the analysis of `document_id` for the current session, or join a
    /// run already in flight for the same key. The underlying call is never
    /// cancelled once started, even if every caller goes away.
    pub async fn analyze_document(&self, document_id: &str) -> Result<AnalysisReport> {
        let session_id = self.session.session_id().await;
        let key = RequestKey::for_document(document_id, session_id.as_deref())?;

        let url = self
            .base_url
            .join(&format!("api/documents/{document_id}/analyze"))?;
        let http = self.http.clone();
        let refresher = self.refresher.clone();

        self.analyses
            .get_or_start(key, move || async move {
                with_auth_retry(&refresher, || {
                    let (http, url) = (http.clone(), url.clone());
                    async move {
                        let response = http.post(url).send().await?;
                        read_json(response).await
                    }
                })
                .await
            })
            .await
    }

    /// Ask a question over the corpus, optionally scoped to specific
    /// documents. Citations come back alongside the answer text.
    pub async fn query(&self, question: &str, document_ids: &[String]) -> Result<QueryAnswer> {
        let url = self.base_url.join("api/query")?;
        let session_id = self.session.session_id().await;
        let http = self.http.clone();
        let body = QueryRequest {
            question: question.to_string(),
            document_ids: document_ids.to_vec(),
            session_id,
        };

        with_auth_retry(&self.refresher, || {
            let (http, url) = (http.clone(), url.clone());
            let body = &body;
            async move {
                let response = http.post(url).json(body).send().await?;
                read_json(response).await
            }
        })
        .await
    }

    pub async fn submit_corrections(
        &self,
        document_id: &str,
        corrections: &[FieldCorrection],
    ) -> Result<AnalysisReport> {
        let url = self
            .base_url
            .join(&format!("api/documents/{document_id}/corrections"))?;
        let http = self.http.clone();

        with_auth_retry(&self.refresher, || {
            let (http, url) = (http.clone(), url.clone());
            let body = CorrectionsRequest { corrections };
            async move {
                let response = http.post(url).json(&body).send().await?;
                read_json(response).await
            }
        })
        .await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let url = self.base_url.join("api/documents")?;
        let http = self.http.clone();

        with_auth_retry(&self.refresher, || {
            let (http, url) = (http.clone(), url.clone());
            async move {
                let response = http.get(url).send().await?;
                read_json(response).await
            }
        })
        .await
    }

    pub async fn get_document(&self, document_id: &str) -> Result<DocumentSummary> {
        let url = self.base_url.join(&format!("api/documents/{document_id}"))?;
        let http = self.http.clone();

        with_auth_retry(&self.refresher, || {
            let (http, url) = (http.clone(), url.clone());
            async move {
                let response = http.get(url).send().await?;
                read_json(response).await
            }
        })
        .await
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        let url = self.base_url.join(&format!("api/documents/{document_id}"))?;
        let http = self.http.clone();

        with_auth_retry(&self.refresher, || {
            let (http, url) = (http.clone(), url.clone());
            async move {
                let response = http.delete(url).send().await?;
                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(classify_failure(response).await)
                }
            }
        })
        .await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(classify_failure(response).await);
    }
    Ok(response.json::<T>().await?)
}
