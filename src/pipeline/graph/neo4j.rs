use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{GraphMaintenance, GraphPath, GraphStore, NetworkDisease, SymptomNetwork};
use crate::config::Neo4jConfig;
use crate::pipeline::RetrievalFailure;

const PATHS_QUERY: &str = "\
UNWIND $tokens AS token \
MATCH (s:Symptom)-[r:PART_OF]->(p:ClinicalPattern)-[i:INDICATES]->(d:Disease) \
WHERE toLower(s.name) CONTAINS toLower(token) \
RETURN DISTINCT s.name, p.name, d.name, r.weight, i.confidence, d.urgency";

const MERGE_LINK_QUERY: &str = "\
MERGE (s:Symptom {name: $symptom}) \
MERGE (d:Disease {name: $disease}) \
SET d.urgency = $urgency \
MERGE (s)-[r:INDICATES]->(d) \
SET r.confidence = $confidence";

const NETWORK_QUERY: &str = "\
MATCH (s:Symptom {name: $symptom})-[r:INDICATES]->(d:Disease) \
OPTIONAL MATCH (d)<-[:INDICATES]-(related:Symptom) \
WHERE related.name <> $symptom \
RETURN d.name, d.urgency, r.confidence, COLLECT(DISTINCT related.name)";

/// Graph store backed by the Neo4j HTTP transactional endpoint
/// (`POST {url}/db/{database}/tx/commit`).
pub struct Neo4jGraph {
    url: String,
    database: String,
    user: String,
    password: String,
    connect_timeout: Duration,
    client: OnceLock<reqwest::Client>,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Deserialize)]
struct RowData {
    row: Value,
}

#[derive(Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

type PathRow = (String, String, String, Option<f32>, Option<f32>, Option<String>);
type NetworkRow = (String, Option<String>, Option<f32>, Vec<Option<String>>);

impl Neo4jGraph {
    pub fn new(config: &Neo4jConfig, connect_timeout: Duration) -> Self {
        Self {
            url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            connect_timeout,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> &reqwest::Client {
        self.client.get_or_init(|| {
            reqwest::Client::builder()
                .connect_timeout(self.connect_timeout)
                .build()
                .unwrap_or_default()
        })
    }

    fn commit_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.url, self.database)
    }

    /// Run one statement and return its rows.
    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Value>, RetrievalFailure> {
        let body = CommitRequest {
            statements: [Statement {
                statement,
                parameters,
            }],
        };

        let response = self
            .client()
            .post(self.commit_url())
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RetrievalFailure::Connection(self.url.clone())
                } else {
                    RetrievalFailure::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalFailure::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CommitResponse = response
            .json()
            .await
            .map_err(|e| RetrievalFailure::MalformedResponse(e.to_string()))?;
        rows_of(parsed)
    }
}

fn rows_of(response: CommitResponse) -> Result<Vec<Value>, RetrievalFailure> {
    if let Some(error) = response.errors.first() {
        return Err(RetrievalFailure::Query(format!(
            "{}: {}",
            error.code, error.message
        )));
    }
    Ok(response
        .results
        .into_iter()
        .next()
        .map(|result| result.data.into_iter().map(|d| d.row).collect())
        .unwrap_or_default())
}

fn parse_path(row: Value) -> Result<GraphPath, RetrievalFailure> {
    let (symptom, pattern, disease, weight, confidence, urgency): PathRow =
        serde_json::from_value(row).map_err(|e| RetrievalFailure::MalformedResponse(e.to_string()))?;
    Ok(GraphPath {
        symptom,
        pattern,
        disease,
        part_of_weight: weight.unwrap_or(0.0),
        indicates_confidence: confidence.unwrap_or(0.0),
        stored_urgency: urgency,
    })
}

fn parse_network(rows: Vec<Value>) -> Result<SymptomNetwork, RetrievalFailure> {
    let mut network = SymptomNetwork::default();
    let mut related = std::collections::BTreeSet::new();
    for row in rows {
        let (name, urgency, confidence, related_names): NetworkRow = serde_json::from_value(row)
            .map_err(|e| RetrievalFailure::MalformedResponse(e.to_string()))?;
        network.diseases.push(NetworkDisease {
            name,
            urgency,
            confidence: confidence.unwrap_or(0.0),
        });
        related.extend(related_names.into_iter().flatten());
    }
    network.related_symptoms = related.into_iter().collect();
    Ok(network)
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn symptom_paths(&self, tokens: &[String]) -> Result<Vec<GraphPath>, RetrievalFailure> {
        let rows = self.run(PATHS_QUERY, json!({ "tokens": tokens })).await?;
        rows.into_iter().map(parse_path).collect()
    }

    async fn is_available(&self) -> bool {
        self.run("RETURN 1", json!({})).await.is_ok()
    }

    fn name(&self) -> &'static str {
        "neo4j"
    }
}

#[async_trait]
impl GraphMaintenance for Neo4jGraph {
    async fn add_symptom_disease(
        &self,
        symptom: &str,
        disease: &str,
        urgency: &str,
        confidence: f32,
    ) -> Result<(), RetrievalFailure> {
        self.run(
            MERGE_LINK_QUERY,
            json!({
                "symptom": symptom,
                "disease": disease,
                "urgency": urgency,
                "confidence": confidence,
            }),
        )
        .await?;
        tracing::info!(disease, "Symptom-disease link merged");
        Ok(())
    }

    async fn symptom_network(&self, symptom: &str) -> Result<SymptomNetwork, RetrievalFailure> {
        let rows = self.run(NETWORK_QUERY, json!({ "symptom": symptom })).await?;
        parse_network(rows)
    }
}
