//! Remote collection gateway
//!
//! Typed access to one document collection. Each record kind declares its
//! collection name and schema through [`Record`]; the gateway decodes stored
//! documents into records at the boundary and encodes records back into
//! top-level fields.
//!
//! Decoding is lenient about missing fields (they take the record's serde
//! defaults) and strict about wrongly typed ones: such documents are skipped
//! when listing and reported as [`GatewayError::Schema`] when fetched by id.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

use crate::db::repositories::DocumentRepository;
use crate::models::{
    ArticleRecord, ClassRecord, Document, Fields, GalleryItemRecord,
};
use crate::models::class::GALLERY_REQUIRED;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },

    /// A client-side rule rejected the working copy
    #[error("{0}")]
    Validation(String),

    #[error("document {collection}/{id} does not match its schema: {source}")]
    Schema {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {collection}: {source:#}")]
    Fetch {
        collection: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write {collection}: {source:#}")]
    Write {
        collection: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// A record kind stored in its own collection.
pub trait Record: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static {
    /// Collection the records live in
    const COLLECTION: &'static str;

    /// Fields the edit dialog writes back
    const EDIT_FIELDS: &'static [&'static str];

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Rules the working copy must satisfy before it is sent
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Whether a decoded record belongs in the section listing
    fn is_listable(&self) -> bool {
        true
    }

    /// Adjust the working copy when an edit dialog opens
    fn prepare_edit(&mut self) {}

    /// Rewrite legacy field names before decoding
    fn normalize(_fields: &mut Fields) {}

    /// Rename legacy keys of an incoming patch to the fields they stand for.
    /// An explicit canonical key in the same patch wins.
    fn canonicalize(_patch: &mut Fields) {}

    /// Encode into top-level document fields (without the id)
    fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        let mut fields = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "record serialized to {} instead of an object",
                    other
                )))
            }
        };
        fields.remove("id");
        Ok(fields)
    }

    fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        let mut fields = document.fields;
        Self::normalize(&mut fields);
        fields.insert("id".to_string(), Value::String(document.id));
        serde_json::from_value(Value::Object(fields))
    }
}

/// Older class documents and editors use these names
const CLASS_LEGACY_FIELDS: [(&str, &str); 2] =
    [("classSummary", "description"), ("heroImage", "imageUrl")];

impl Record for ClassRecord {
    const COLLECTION: &'static str = "classes";
    const EDIT_FIELDS: &'static [&'static str] = &[
        "classname",
        "ageRange",
        "description",
        "imageUrl",
        "dailyLife",
        "funActivities",
        "galleryImages",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), String> {
        if self.gallery_images.is_empty() {
            return Err(GALLERY_REQUIRED.to_string());
        }
        Ok(())
    }

    fn is_listable(&self) -> bool {
        self.is_complete()
    }

    fn prepare_edit(&mut self) {
        self.pad_daily_life(crate::models::class::DAILY_LIFE_SLOTS);
    }

    fn normalize(fields: &mut Fields) {
        for (legacy, canonical) in CLASS_LEGACY_FIELDS {
            if fields.contains_key(canonical) {
                fields.remove(legacy);
            }
        }
    }

    fn canonicalize(patch: &mut Fields) {
        for (legacy, canonical) in CLASS_LEGACY_FIELDS {
            if let Some(value) = patch.remove(legacy) {
                patch.entry(canonical).or_insert(value);
            }
        }
    }
}

impl Record for ArticleRecord {
    const COLLECTION: &'static str = "news-events";
    const EDIT_FIELDS: &'static [&'static str] =
        &["title", "description", "author", "category", "date", "imageUrl"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if !self.date.is_empty()
            && chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err()
        {
            return Err(format!("Invalid date '{}', expected YYYY-MM-DD", self.date));
        }
        Ok(())
    }
}

/// Fields written by the article content editor
pub const ARTICLE_CONTENT_FIELDS: &[&str] = &["content"];

impl Record for GalleryItemRecord {
    const COLLECTION: &'static str = "gallery";
    const EDIT_FIELDS: &'static [&'static str] = &["title", "description", "category", "tags"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("Image URL is required".to_string());
        }
        Ok(())
    }
}

/// Typed read/write access to the collection of `R`.
pub struct CollectionGateway<R> {
    repo: Arc<dyn DocumentRepository>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for CollectionGateway<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> CollectionGateway<R> {
    pub fn new(repo: Arc<dyn DocumentRepository>) -> Self {
        Self {
            repo,
            _record: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        R::COLLECTION
    }

    fn fetch_error(source: anyhow::Error) -> GatewayError {
        GatewayError::Fetch {
            collection: R::COLLECTION,
            source,
        }
    }

    fn write_error(source: anyhow::Error) -> GatewayError {
        GatewayError::Write {
            collection: R::COLLECTION,
            source,
        }
    }

    fn not_found(id: &str) -> GatewayError {
        GatewayError::NotFound {
            collection: R::COLLECTION,
            id: id.to_string(),
        }
    }

    fn decode(document: Document) -> Result<R, GatewayError> {
        let id = document.id.clone();
        R::from_document(document).map_err(|source| GatewayError::Schema {
            collection: R::COLLECTION,
            id,
            source,
        })
    }

    fn encode(record: &R) -> Result<Fields, GatewayError> {
        record.to_fields().map_err(|e| {
            Self::write_error(anyhow::Error::new(e).context("Failed to encode record"))
        })
    }

    /// Every listable record in insertion order.
    ///
    /// Documents that fail to decode are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<R>, GatewayError> {
        let documents = self
            .repo
            .list(R::COLLECTION)
            .await
            .map_err(Self::fetch_error)?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            match Self::decode(document) {
                Ok(record) if record.is_listable() => records.push(record),
                Ok(record) => {
                    tracing::debug!("Skipping incomplete {} document {}", R::COLLECTION, record.id());
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }
        Ok(records)
    }

    pub async fn find(&self, id: &str) -> Result<Option<R>, GatewayError> {
        let document = self
            .repo
            .get(R::COLLECTION, id)
            .await
            .map_err(Self::fetch_error)?;
        document.map(Self::decode).transpose()
    }

    pub async fn get(&self, id: &str) -> Result<R, GatewayError> {
        self.find(id).await?.ok_or_else(|| Self::not_found(id))
    }

    /// Store a new record and return it with its generated id
    pub async fn create(&self, record: &R) -> Result<R, GatewayError> {
        let fields = Self::encode(record)?;
        self.create_fields(fields).await
    }

    pub async fn create_fields(&self, fields: Fields) -> Result<R, GatewayError> {
        let document = self
            .repo
            .create(R::COLLECTION, fields)
            .await
            .map_err(Self::write_error)?;
        Self::decode(document)
    }

    /// Merge `fields` into an existing record
    pub async fn update(&self, id: &str, fields: Fields) -> Result<(), GatewayError> {
        let found = self
            .repo
            .update(R::COLLECTION, id, fields)
            .await
            .map_err(Self::write_error)?;
        if found {
            Ok(())
        } else {
            Err(Self::not_found(id))
        }
    }

    /// Merge `fields` into the record, creating it under `id` if missing
    pub async fn set(&self, id: &str, fields: Fields) -> Result<R, GatewayError> {
        let document = self
            .repo
            .set(R::COLLECTION, id, fields)
            .await
            .map_err(Self::write_error)?;
        Self::decode(document)
    }

    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let deleted = self
            .repo
            .delete(R::COLLECTION, id)
            .await
            .map_err(Self::write_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Self::not_found(id))
        }
    }

    /// Remove the whole collection; all or nothing
    pub async fn delete_all(&self) -> Result<u64, GatewayError> {
        let removed = self
            .repo
            .delete_all(R::COLLECTION)
            .await
            .map_err(Self::write_error)?;
        tracing::info!("Deleted {} document(s) from {}", removed, R::COLLECTION);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxDocumentRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ArticleCategory, ListItem};
    use serde_json::json;

    async fn repo() -> Arc<dyn DocumentRepository> {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxDocumentRepository::boxed(pool)
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn article(title: &str, category: ArticleCategory) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            category,
            date: "2021-03-15".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_get_decodes() {
        let gateway = CollectionGateway::<ArticleRecord>::new(repo().await);
        let created = gateway
            .create(&article("Story Night 2021", ArticleCategory::Events))
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let fetched = gateway.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_id_is_not_stored_in_fields() {
        let repo = repo().await;
        let gateway = CollectionGateway::<GalleryItemRecord>::new(repo.clone());
        let created = gateway
            .create(&GalleryItemRecord {
                id: "ignored".to_string(),
                url: "/uploads/a.jpg".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_ne!(created.id, "ignored");
        let document = repo.get("gallery", &created.id).await.unwrap().unwrap();
        assert!(!document.fields.contains_key("id"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let gateway = CollectionGateway::<ClassRecord>::new(repo().await);
        let err = gateway.get("nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { collection: "classes", .. }));
    }

    #[tokio::test]
    async fn test_list_skips_malformed_and_incomplete_classes() {
        let repo = repo().await;
        repo.create(
            "classes",
            fields(json!({"classname": "Smart Lions", "ageRange": "3-4", "classSummary": "Roar"})),
        )
        .await
        .unwrap();
        repo.create("classes", fields(json!({"classname": "No Age", "description": "x"})))
            .await
            .unwrap();
        repo.create(
            "classes",
            fields(json!({"classname": "Broken", "ageRange": "1", "description": "x", "dailyLife": "oops"})),
        )
        .await
        .unwrap();

        let gateway = CollectionGateway::<ClassRecord>::new(repo);
        let classes = gateway.list().await.unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].classname, "Smart Lions");
        assert_eq!(classes[0].description, "Roar");
    }

    #[tokio::test]
    async fn test_get_malformed_is_schema_error() {
        let repo = repo().await;
        let doc = repo
            .create("news-events", fields(json!({"title": "x", "category": "Gossip"})))
            .await
            .unwrap();

        let gateway = CollectionGateway::<ArticleRecord>::new(repo);
        let err = gateway.get(&doc.id).await.unwrap_err();
        assert!(matches!(err, GatewayError::Schema { .. }));
    }

    #[tokio::test]
    async fn test_canonical_field_wins_over_legacy() {
        let repo = repo().await;
        let doc = repo
            .create(
                "classes",
                fields(json!({"classname": "Wise Mice", "description": "new", "classSummary": "old"})),
            )
            .await
            .unwrap();

        let gateway = CollectionGateway::<ClassRecord>::new(repo);
        assert_eq!(gateway.get(&doc.id).await.unwrap().description, "new");
    }

    #[tokio::test]
    async fn test_update_merges_and_missing_is_not_found() {
        let gateway = CollectionGateway::<ArticleRecord>::new(repo().await);
        let created = gateway
            .create(&article("Old", ArticleCategory::News))
            .await
            .unwrap();

        gateway
            .update(&created.id, fields(json!({"title": "New"})))
            .await
            .unwrap();
        let fetched = gateway.get(&created.id).await.unwrap();
        assert_eq!(fetched.title, "New");
        assert_eq!(fetched.date, "2021-03-15");

        let err = gateway
            .update("missing", fields(json!({"title": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_upserts() {
        let gateway = CollectionGateway::<ClassRecord>::new(repo().await);
        let draft = ClassRecord {
            daily_life: vec![ListItem::new("Nap", "Quiet time")],
            ..ClassRecord::from_slug("wise-mice")
        };
        let saved = gateway
            .set("wise-mice", draft.to_fields().unwrap())
            .await
            .unwrap();
        assert_eq!(saved.id, "wise-mice");
        assert_eq!(saved.classname, "Wise Mice");

        gateway
            .set("wise-mice", fields(json!({"ageRange": "4"})))
            .await
            .unwrap();
        let fetched = gateway.get("wise-mice").await.unwrap();
        assert_eq!(fetched.age_range, "4");
        assert_eq!(fetched.daily_life.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_all_then_list_is_empty() {
        let gateway = CollectionGateway::<ArticleRecord>::new(repo().await);
        for title in ["a", "b", "c"] {
            gateway
                .create(&article(title, ArticleCategory::News))
                .await
                .unwrap();
        }

        assert_eq!(gateway.delete_all().await.unwrap(), 3);
        assert!(gateway.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let gateway = CollectionGateway::<GalleryItemRecord>::new(repo().await);
        assert!(matches!(
            gateway.delete("ghost").await.unwrap_err(),
            GatewayError::NotFound { .. }
        ));
    }

    #[test]
    fn test_record_validation() {
        let class = ClassRecord::from_slug("smart-lions");
        assert_eq!(class.validate().unwrap_err(), GALLERY_REQUIRED);

        let mut bad_date = article("x", ArticleCategory::News);
        bad_date.date = "15/03/2021".to_string();
        assert!(bad_date.validate().is_err());
        assert!(article("", ArticleCategory::News).validate().is_err());

        assert!(GalleryItemRecord::default().validate().is_err());
    }
}
