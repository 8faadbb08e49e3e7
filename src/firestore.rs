use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::db::{DocumentStore, SectionRecord};
use crate::error::StoreError;
use crate::settings::Settings;

const PRODUCTION_ROOT: &str = "https://firestore.googleapis.com/v1";
const EMULATOR_TOKEN: &str = "owner";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Firestore over its REST API.
///
/// Writes are `PATCH` without an update mask, which replaces the whole
/// document, creating it if absent.
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: String,
    api_key: Option<String>,
    bearer: Option<String>,
}

impl FirestoreStore {
    pub fn from_settings(settings: &Settings) -> Result<Self, StoreError> {
        Self::with_root(settings, PRODUCTION_ROOT)
    }

    /// `production_root` is used whenever no emulator host is configured.
    fn with_root(settings: &Settings, production_root: &str) -> Result<Self, StoreError> {
        let project = non_empty(&settings.project_id)
            .ok_or_else(|| StoreError::Config("GCP_PROJECT_ID is not set".into()))?;

        let (root, api_key, bearer) = match non_empty(&settings.emulator_host) {
            Some(host) => (
                format!("http://{}/v1", host),
                None,
                Some(EMULATOR_TOKEN.to_string()),
            ),
            None => (
                production_root.to_string(),
                non_empty(&settings.api_key).map(str::to_string),
                non_empty(&settings.access_token).map(str::to_string),
            ),
        };

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/{}/documents",
                root,
                project,
                settings.database_id()
            ),
            api_key,
            bearer,
        })
    }

    pub fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn set(
        &self,
        collection: &str,
        id: &str,
        record: &SectionRecord,
    ) -> Result<(), StoreError> {
        let url = self.document_url(collection, id);
        let body = encode_document(record)?;

        let mut request = self.client.patch(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        debug!(collection, id, %status, "document written");
        Ok(())
    }
}

/// Wrap a record as a Firestore `Document` body: `{"fields": {...}}`.
pub fn encode_document<T: serde::Serialize>(record: &T) -> Result<Value, StoreError> {
    let fields = match serde_json::to_value(record)? {
        Value::Object(map) => encode_fields(map),
        other => {
            return Err(StoreError::Config(format!(
                "document must be a JSON object, got {}",
                other
            )))
        }
    };
    Ok(json!({ "fields": fields }))
}

fn encode_fields(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, encode_value(v))).collect()
}

/// Map a JSON value to Firestore's typed `Value` representation.
fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        // integerValue travels as a decimal string
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.into_iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

// ── Tests ──
