use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::KnowledgeIndex;
use crate::pipeline::types::{clamp_unit, KnowledgeSnippet};
use crate::pipeline::RetrievalFailure;

/// Client for a remote search endpoint.
///
/// `POST {base}/search` with `{"query", "top_k"}` answers
/// `{"results": [{"text", "score", "source_id"}]}`; `GET {base}/health`
/// answers 2xx when the index is loaded.
pub struct HttpKnowledgeIndex {
    base_url: String,
    connect_timeout: Duration,
    client: OnceLock<reqwest::Client>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    text: String,
    score: f32,
    #[serde(default)]
    source_id: Option<String>,
}

impl HttpKnowledgeIndex {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            connect_timeout,
            client: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> &reqwest::Client {
        self.client.get_or_init(|| {
            reqwest::Client::builder()
                .connect_timeout(self.connect_timeout)
                .build()
                .unwrap_or_default()
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> RetrievalFailure {
        if e.is_connect() {
            RetrievalFailure::Connection(self.base_url.clone())
        } else {
            RetrievalFailure::HttpClient(e.to_string())
        }
    }
}

#[async_trait]
impl KnowledgeIndex for HttpKnowledgeIndex {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSnippet>, RetrievalFailure> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client()
            .post(&url)
            .json(&SearchRequest { query, top_k })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalFailure::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalFailure::MalformedResponse(e.to_string()))?;

        Ok(into_snippets(parsed, top_k))
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client().get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &'static str {
        "http-index"
    }
}

fn into_snippets(response: SearchResponse, top_k: usize) -> Vec<KnowledgeSnippet> {
    response
        .results
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(rank, hit)| KnowledgeSnippet {
            text: hit.text,
            source_id: hit.source_id.unwrap_or_else(|| format!("remote-{rank}")),
            relevance_score: clamp_unit(hit.score),
        })
        .collect()
}
