//! HTTP client for Confluent-compatible schema registries
//!
//! Stateless per call: every operation is exactly one request/response round
//! trip, translated into typed results and the crate's canonical error type.
//! Retry policy, if any, belongs to the caller.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{
    CompatibilityLevel, RegistryConfig, RegisteredSchema, SchemaId, SchemaType, SchemaVersion,
    Subject, SubjectVersionPair, UnregisteredSchema,
};

const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

#[derive(Debug, Serialize)]
struct SchemaRequest<'a> {
    schema: &'a str,
    #[serde(rename = "schemaType")]
    schema_type: SchemaType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    references: Vec<ReferenceRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct ReferenceRequest<'a> {
    name: &'a str,
    subject: &'a str,
    version: u32,
}

impl<'a> SchemaRequest<'a> {
    fn from(schema: &'a UnregisteredSchema) -> Self {
        Self {
            schema: &schema.schema,
            schema_type: schema.schema_type,
            references: schema
                .references
                .iter()
                .map(|r| ReferenceRequest {
                    name: &r.name,
                    subject: &r.subject,
                    version: r.version,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaByIdResponse {
    schema: String,
    #[serde(rename = "schemaType", default)]
    schema_type: SchemaType,
}

#[derive(Debug, Deserialize)]
struct SubjectVersionResponse {
    subject: String,
    version: u32,
    id: u32,
    schema: String,
    #[serde(rename = "schemaType", default)]
    schema_type: SchemaType,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    id: u32,
    #[serde(default)]
    schema: Option<String>,
    #[serde(rename = "schemaType", default)]
    schema_type: Option<SchemaType>,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    id: u32,
    version: u32,
    #[serde(default)]
    schema: Option<String>,
    #[serde(rename = "schemaType", default)]
    schema_type: Option<SchemaType>,
}

#[derive(Debug, Deserialize)]
struct VersionForIdResponse {
    subject: String,
    version: u32,
}

#[derive(Debug, Deserialize)]
struct CompatibilityResponse {
    is_compatible: bool,
}

#[derive(Debug, Serialize)]
struct ConfigRequest {
    compatibility: CompatibilityLevel,
}

#[derive(Debug, Deserialize)]
struct ConfigResponse {
    #[serde(rename = "compatibilityLevel", alias = "compatibility")]
    compatibility_level: CompatibilityLevel,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}

/// Schema fetched by id; the registry does not echo subject or version here.
#[derive(Debug, Clone)]
pub struct SchemaById {
    pub schema: String,
    pub schema_type: SchemaType,
}

/// Outcome of a registration round trip.
///
/// Only `id` is guaranteed by the registry; some implementations omit the
/// echoed schema and type, so both stay `Option` and callers backfill from
/// the request.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub id: SchemaId,
    pub schema: Option<String>,
    pub schema_type: Option<SchemaType>,
}

/// Outcome of a schema lookup by content (`POST /subjects/{subject}`).
///
/// Same caveat as [`RegisterOutcome`]: `schema` and `schema_type` may be
/// omitted by the registry and must then be backfilled from the request.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub id: SchemaId,
    pub version: SchemaVersion,
    pub schema: Option<String>,
    pub schema_type: Option<SchemaType>,
}

/// Client for the registry's REST surface.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// Build a client from connection settings. Basic auth credentials, when
    /// present, are attached to every request as a default header.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            use base64::Engine;
            use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            let mut auth = HeaderValue::from_str(&format!("Basic {}", encoded))
                .map_err(|e| Error::Config(e.to_string()))?;
            auth.set_sensitive(true);

            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, auth);
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /schemas/ids/{id}`
    pub async fn schema_by_id(&self, id: SchemaId) -> Result<SchemaById> {
        let url = format!("{}/schemas/ids/{}", self.base_url, id);
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        let body: SchemaByIdResponse = read_json(response).await?;

        tracing::debug!(schema_id = %id, schema_type = %body.schema_type, "fetched schema by id");

        Ok(SchemaById {
            schema: body.schema,
            schema_type: body.schema_type,
        })
    }

    /// `GET /schemas/types`: format tags the registry supports, returned as
    /// raw strings so unknown formats do not fail the listing.
    pub async fn schema_types(&self) -> Result<Vec<String>> {
        let url = format!("{}/schemas/types", self.base_url);
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        read_json(response).await
    }

    /// `GET /subjects`
    pub async fn subjects(&self) -> Result<Vec<Subject>> {
        let url = format!("{}/subjects", self.base_url);
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        let names: Vec<String> = read_json(response).await?;
        Ok(names.into_iter().map(Subject::new).collect())
    }

    /// `GET /subjects/{subject}/versions`
    pub async fn versions(&self, subject: &Subject) -> Result<Vec<u32>> {
        let url = format!("{}/subjects/{}/versions", self.base_url, subject);
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        read_json(response).await
    }

    /// `GET /schemas/ids/{id}/versions`: every (subject, version) pair the
    /// id is registered under.
    pub async fn versions_for_id(&self, id: SchemaId) -> Result<Vec<SubjectVersionPair>> {
        let url = format!("{}/schemas/ids/{}/versions", self.base_url, id);
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        let pairs: Vec<VersionForIdResponse> = read_json(response).await?;
        Ok(pairs
            .into_iter()
            .map(|p| SubjectVersionPair {
                subject: Subject::new(p.subject),
                version: SchemaVersion::new(p.version),
            })
            .collect())
    }

    /// `DELETE /subjects/{subject}[?permanent=true]`: returns the deleted
    /// version numbers.
    pub async fn delete_subject(&self, subject: &Subject, permanent: bool) -> Result<Vec<u32>> {
        let mut url = format!("{}/subjects/{}", self.base_url, subject);
        if permanent {
            url.push_str("?permanent=true");
        }
        let response = self.http.delete(&url).header("Accept", CONTENT_TYPE).send().await?;
        let versions: Vec<u32> = read_json(response).await?;

        tracing::debug!(%subject, permanent, ?versions, "deleted subject");

        Ok(versions)
    }

    /// `GET /subjects/{subject}/versions/{version|latest}`; `None` resolves
    /// to the newest version server-side.
    pub async fn schema_by_version(
        &self,
        subject: &Subject,
        version: Option<u32>,
    ) -> Result<RegisteredSchema> {
        let url = format!(
            "{}/subjects/{}/versions/{}",
            self.base_url,
            subject,
            version_path(version),
        );
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        let body: SubjectVersionResponse = read_json(response).await?;

        Ok(RegisteredSchema {
            subject: Subject::new(body.subject),
            id: SchemaId::new(body.id),
            version: SchemaVersion::new(body.version),
            schema: body.schema,
            schema_type: body.schema_type,
        })
    }

    /// `GET /subjects/{subject}/versions/{version}/schema`: the serialized
    /// schema exactly as stored, not JSON-decoded.
    pub async fn raw_schema(&self, subject: &Subject, version: u32) -> Result<String> {
        let url = format!(
            "{}/subjects/{}/versions/{}/schema",
            self.base_url, subject, version
        );
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response.text().await?)
        } else {
            Err(error_from_body(status, response.text().await?))
        }
    }

    /// `POST /subjects/{subject}/versions`: register a new schema version.
    /// Registering a schema that already exists is idempotent registry-side
    /// and returns the existing id.
    pub async fn register(
        &self,
        subject: &Subject,
        schema: &UnregisteredSchema,
    ) -> Result<RegisterOutcome> {
        let url = format!("{}/subjects/{}/versions", self.base_url, subject);
        let response = self
            .http
            .post(&url)
            .header("Content-Type", CONTENT_TYPE)
            .json(&SchemaRequest::from(schema))
            .send()
            .await?;
        let body: RegisterResponse = read_json(response).await?;

        tracing::debug!(%subject, schema_id = body.id, "registered schema");

        Ok(RegisterOutcome {
            id: SchemaId::new(body.id),
            schema: body.schema,
            schema_type: body.schema_type,
        })
    }

    /// `POST /subjects/{subject}`: look up an already-registered matching
    /// schema without creating a new version. A 404 `Registry` error means
    /// no match exists.
    pub async fn check(
        &self,
        subject: &Subject,
        schema: &UnregisteredSchema,
    ) -> Result<CheckOutcome> {
        let url = format!("{}/subjects/{}", self.base_url, subject);
        let response = self
            .http
            .post(&url)
            .header("Content-Type", CONTENT_TYPE)
            .json(&SchemaRequest::from(schema))
            .send()
            .await?;
        let body: CheckResponse = read_json(response).await?;

        Ok(CheckOutcome {
            id: SchemaId::new(body.id),
            version: SchemaVersion::new(body.version),
            schema: body.schema,
            schema_type: body.schema_type,
        })
    }

    /// `POST /compatibility/subjects/{subject}/versions/{version|latest}`:
    /// true iff `schema` is compatible under the subject's current policy.
    pub async fn test_compatibility(
        &self,
        subject: &Subject,
        version: Option<u32>,
        schema: &UnregisteredSchema,
        verbose: bool,
    ) -> Result<bool> {
        let mut url = format!(
            "{}/compatibility/subjects/{}/versions/{}",
            self.base_url,
            subject,
            version_path(version),
        );
        if verbose {
            url.push_str("?verbose=true");
        }
        let response = self
            .http
            .post(&url)
            .header("Content-Type", CONTENT_TYPE)
            .json(&SchemaRequest::from(schema))
            .send()
            .await?;
        let body: CompatibilityResponse = read_json(response).await?;
        Ok(body.is_compatible)
    }

    /// `GET /config`: registry-wide default compatibility level
    pub async fn global_config(&self) -> Result<CompatibilityLevel> {
        let url = format!("{}/config", self.base_url);
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        let body: ConfigResponse = read_json(response).await?;
        Ok(body.compatibility_level)
    }

    /// `PUT /config`
    pub async fn set_global_config(&self, level: CompatibilityLevel) -> Result<CompatibilityLevel> {
        let url = format!("{}/config", self.base_url);
        self.put_config(&url, level).await
    }

    /// `GET /config/{subject}`
    pub async fn subject_config(&self, subject: &Subject) -> Result<CompatibilityLevel> {
        let url = format!("{}/config/{}", self.base_url, subject);
        let response = self.http.get(&url).header("Accept", CONTENT_TYPE).send().await?;
        let body: ConfigResponse = read_json(response).await?;
        Ok(body.compatibility_level)
    }

    /// `PUT /config/{subject}`
    pub async fn set_subject_config(
        &self,
        subject: &Subject,
        level: CompatibilityLevel,
    ) -> Result<CompatibilityLevel> {
        let url = format!("{}/config/{}", self.base_url, subject);
        self.put_config(&url, level).await
    }

    async fn put_config(&self, url: &str, level: CompatibilityLevel) -> Result<CompatibilityLevel> {
        let response = self
            .http
            .put(url)
            .header("Content-Type", CONTENT_TYPE)
            .json(&ConfigRequest {
                compatibility: level,
            })
            .send()
            .await?;
        let body: ConfigResponse = read_json(response).await?;
        Ok(body.compatibility_level)
    }
}

fn version_path(version: Option<u32>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "latest".to_string(),
    }
}

/// Read a JSON success body, or normalize a non-2xx response into the
/// canonical error type.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json().await?)
    } else {
        Err(error_from_body(status, response.text().await?))
    }
}

/// Normalize a non-2xx body: empty bodies are unclassifiable, JSON bodies
/// become `Registry` errors with "not found" codes squashed to 404, and a
/// body that fails to parse surfaces the parse failure itself.
fn error_from_body(status: StatusCode, body: String) -> Error {
    if body.is_empty() {
        return Error::EmptyResponse {
            status: status.as_u16(),
        };
    }
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => Error::registry(
            parsed.error_code.unwrap_or_else(|| status.as_u16() as u32),
            parsed.message.unwrap_or(body),
        ),
        Err(source) => Error::MalformedBody {
            status: status.as_u16(),
            source,
        },
    }
}
