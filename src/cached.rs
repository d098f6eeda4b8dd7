//! Cache-augmented registry client
//!
//! Composition rather than inheritance: [`CachedRegistry`] owns a plain
//! [`RegistryClient`] and memoizes exactly the three operations that repeat
//! on the hot encode/decode path: schema lookup by content, latest-version
//! fetch, and schema fetch by id. Every other operation delegates uncached.

use crate::cache::{fingerprint, normalize_json, KeyBuilder, MemoCache};
use crate::client::{CheckOutcome, RegisterOutcome, RegistryClient, SchemaById};
use crate::error::Result;
use crate::types::{
    CompatibilityLevel, RegistryConfig, RegisteredSchema, SchemaId, Subject, SubjectVersionPair,
    UnregisteredSchema,
};

pub struct CachedRegistry {
    client: RegistryClient,
    check_cache: MemoCache<CheckOutcome>,
    latest_cache: MemoCache<RegisteredSchema>,
    id_cache: MemoCache<SchemaById>,
}

impl CachedRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        Ok(Self::with_client(RegistryClient::new(config)?))
    }

    pub fn with_client(client: RegistryClient) -> Self {
        Self {
            client,
            check_cache: MemoCache::new(),
            latest_cache: MemoCache::new(),
            id_cache: MemoCache::new(),
        }
    }

    /// The uncached client, for operations with no memoized wrapper.
    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    /// Drop every memoized result, forcing the next calls to refetch.
    pub fn clear_cache(&self) {
        self.check_cache.clear();
        self.latest_cache.clear();
        self.id_cache.clear();
    }

    /// Memoized [`RegistryClient::check`]. The key hashes the schema content
    /// (whitespace-normalized) together with its type and references, so
    /// equivalent lookups hit regardless of schema formatting.
    pub async fn check(
        &self,
        subject: &Subject,
        schema: &UnregisteredSchema,
    ) -> Result<CheckOutcome> {
        let key = KeyBuilder::new("check")
            .push(subject)
            .push(schema_digest(schema))
            .build();
        self.check_cache
            .get_or_try_insert(&key, || self.client.check(subject, schema))
            .await
    }

    /// Memoized latest-version fetch for a subject.
    pub async fn latest_version(&self, subject: &Subject) -> Result<RegisteredSchema> {
        let key = KeyBuilder::new("latest").push(subject).build();
        self.latest_cache
            .get_or_try_insert(&key, || self.client.schema_by_version(subject, None))
            .await
    }

    /// Memoized [`RegistryClient::schema_by_id`]. Ids are immutable once
    /// issued, so entries never go stale.
    pub async fn schema_by_id(&self, id: SchemaId) -> Result<SchemaById> {
        let key = KeyBuilder::new("schema_by_id").push(id).build();
        self.id_cache
            .get_or_try_insert(&key, || self.client.schema_by_id(id))
            .await
    }

    // Uncached delegations.

    pub async fn register(
        &self,
        subject: &Subject,
        schema: &UnregisteredSchema,
    ) -> Result<RegisterOutcome> {
        self.client.register(subject, schema).await
    }

    pub async fn versions_for_id(&self, id: SchemaId) -> Result<Vec<SubjectVersionPair>> {
        self.client.versions_for_id(id).await
    }

    pub async fn subjects(&self) -> Result<Vec<Subject>> {
        self.client.subjects().await
    }

    pub async fn versions(&self, subject: &Subject) -> Result<Vec<u32>> {
        self.client.versions(subject).await
    }

    pub async fn schema_types(&self) -> Result<Vec<String>> {
        self.client.schema_types().await
    }

    pub async fn schema_by_version(
        &self,
        subject: &Subject,
        version: Option<u32>,
    ) -> Result<RegisteredSchema> {
        self.client.schema_by_version(subject, version).await
    }

    pub async fn raw_schema(&self, subject: &Subject, version: u32) -> Result<String> {
        self.client.raw_schema(subject, version).await
    }

    /// Deletes the subject and evicts its memoized latest version.
    pub async fn delete_subject(&self, subject: &Subject, permanent: bool) -> Result<Vec<u32>> {
        let versions = self.client.delete_subject(subject, permanent).await?;
        let key = KeyBuilder::new("latest").push(subject).build();
        self.latest_cache.remove(&key);
        Ok(versions)
    }

    pub async fn test_compatibility(
        &self,
        subject: &Subject,
        version: Option<u32>,
        schema: &UnregisteredSchema,
        verbose: bool,
    ) -> Result<bool> {
        self.client
            .test_compatibility(subject, version, schema, verbose)
            .await
    }

    pub async fn global_config(&self) -> Result<CompatibilityLevel> {
        self.client.global_config().await
    }

    pub async fn set_global_config(&self, level: CompatibilityLevel) -> Result<CompatibilityLevel> {
        self.client.set_global_config(level).await
    }

    pub async fn subject_config(&self, subject: &Subject) -> Result<CompatibilityLevel> {
        self.client.subject_config(subject).await
    }

    pub async fn set_subject_config(
        &self,
        subject: &Subject,
        level: CompatibilityLevel,
    ) -> Result<CompatibilityLevel> {
        self.client.set_subject_config(subject, level).await
    }
}

fn schema_digest(schema: &UnregisteredSchema) -> String {
    fingerprint(&(
        normalize_json(&schema.schema),
        schema.schema_type,
        &schema.references,
    ))
}
