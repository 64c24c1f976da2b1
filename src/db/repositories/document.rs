//! Document repository
//!
//! Schemaless storage of JSON documents grouped into named collections.
//!
//! This module provides:
//! - `DocumentRepository` trait defining the document store interface
//! - `SqlxDocumentRepository` implementing the trait for SQLite and MySQL
//!
//! Listing order is insertion order (`seq`). Updates merge top-level fields
//! (last write wins); nothing is versioned or soft-deleted.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::document::{merge_fields, new_document_id, Document, Fields};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Document repository trait
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Every document of a collection, oldest first
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Insert a document under a freshly generated id
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document>;

    /// Merge `fields` into an existing document.
    ///
    /// Returns `false` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<bool>;

    /// Merge into the document, creating it under `id` when missing
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<Document>;

    /// Returns `false` when nothing was deleted
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Delete the whole collection in one statement
    async fn delete_all(&self, collection: &str) -> Result<u64>;
}

/// SQLx-based document repository implementation
pub struct SqlxDocumentRepository {
    pool: DynDatabasePool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DocumentRepository> {
        Arc::new(Self::new(pool))
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool
            .as_sqlite()
            .context("SQLite driver without a SQLite pool")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool
            .as_mysql()
            .context("MySQL driver without a MySQL pool")
    }
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_documents_sqlite(self.sqlite()?, collection).await,
            DatabaseDriver::Mysql => list_documents_mysql(self.mysql()?, collection).await,
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_document_sqlite(self.sqlite()?, collection, id).await,
            DatabaseDriver::Mysql => get_document_mysql(self.mysql()?, collection, id).await,
        }
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document> {
        let document = Document::new(new_document_id(), fields);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                insert_document_sqlite(self.sqlite()?, collection, &document).await?
            }
            DatabaseDriver::Mysql => {
                insert_document_mysql(self.mysql()?, collection, &document).await?
            }
        }
        Ok(document)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                merge_document_sqlite(self.sqlite()?, collection, id, fields, false)
                    .await
                    .map(|doc| doc.is_some())
            }
            DatabaseDriver::Mysql => {
                merge_document_mysql(self.mysql()?, collection, id, fields, false)
                    .await
                    .map(|doc| doc.is_some())
            }
        }
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<Document> {
        let merged = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                merge_document_sqlite(self.sqlite()?, collection, id, fields, true).await?
            }
            DatabaseDriver::Mysql => {
                merge_document_mysql(self.mysql()?, collection, id, fields, true).await?
            }
        };
        merged.with_context(|| format!("Upsert of {}/{} produced no document", collection, id))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_document_sqlite(self.sqlite()?, collection, id).await,
            DatabaseDriver::Mysql => delete_document_mysql(self.mysql()?, collection, id).await,
        }
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_all_documents_sqlite(self.sqlite()?, collection).await,
            DatabaseDriver::Mysql => delete_all_documents_mysql(self.mysql()?, collection).await,
        }
    }
}

fn encode_fields(fields: &Fields) -> Result<String> {
    serde_json::to_string(fields).context("Failed to encode document fields")
}

fn decode_fields(raw: &str, id: &str) -> Result<Fields> {
    serde_json::from_str(raw).with_context(|| format!("Document {} holds invalid JSON", id))
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_documents_sqlite(pool: &SqlitePool, collection: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query(
        r#"
        SELECT id, fields, created_at, updated_at
        FROM documents
        WHERE collection = ?
        ORDER BY seq ASC
        "#,
    )
    .bind(collection)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list collection {}", collection))?;

    rows.iter().map(row_to_document_sqlite).collect()
}

async fn get_document_sqlite(
    pool: &SqlitePool,
    collection: &str,
    id: &str,
) -> Result<Option<Document>> {
    let row = sqlx::query(
        r#"
        SELECT id, fields, created_at, updated_at
        FROM documents
        WHERE collection = ? AND id = ?
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get document {}/{}", collection, id))?;

    row.as_ref().map(row_to_document_sqlite).transpose()
}

async fn insert_document_sqlite(
    pool: &SqlitePool,
    collection: &str,
    document: &Document,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, fields, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(collection)
    .bind(&document.id)
    .bind(encode_fields(&document.fields)?)
    .bind(document.created_at)
    .bind(document.updated_at)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to create document in {}", collection))?;

    Ok(())
}

/// Read-merge-write inside one transaction.
///
/// With `upsert` the document is created when missing; otherwise `None` is
/// returned for a missing document.
async fn merge_document_sqlite(
    pool: &SqlitePool,
    collection: &str,
    id: &str,
    patch: Fields,
    upsert: bool,
) -> Result<Option<Document>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        "SELECT id, fields, created_at, updated_at FROM documents WHERE collection = ? AND id = ?",
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .with_context(|| format!("Failed to read document {}/{}", collection, id))?;

    let document = match row {
        Some(row) => {
            let mut document = row_to_document_sqlite(&row)?;
            document.merge(patch);
            sqlx::query(
                "UPDATE documents SET fields = ?, updated_at = ? WHERE collection = ? AND id = ?",
            )
            .bind(encode_fields(&document.fields)?)
            .bind(document.updated_at)
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to update document {}/{}", collection, id))?;
            document
        }
        None if upsert => {
            let mut fields = Fields::new();
            merge_fields(&mut fields, patch);
            let document = Document::new(id, fields);
            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, fields, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(collection)
            .bind(id)
            .bind(encode_fields(&document.fields)?)
            .bind(document.created_at)
            .bind(document.updated_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to create document {}/{}", collection, id))?;
            document
        }
        None => return Ok(None),
    };

    tx.commit().await.context("Failed to commit transaction")?;
    Ok(Some(document))
}

async fn delete_document_sqlite(pool: &SqlitePool, collection: &str, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete document {}/{}", collection, id))?;

    Ok(result.rows_affected() > 0)
}

async fn delete_all_documents_sqlite(pool: &SqlitePool, collection: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = ?")
        .bind(collection)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to clear collection {}", collection))?;

    Ok(result.rows_affected())
}

fn row_to_document_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Document> {
    let id: String = row.get("id");
    let raw: String = row.get("fields");
    Ok(Document {
        fields: decode_fields(&raw, &id)?,
        id,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_documents_mysql(pool: &MySqlPool, collection: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query(
        r#"
        SELECT id, fields, created_at, updated_at
        FROM documents
        WHERE collection = ?
        ORDER BY seq ASC
        "#,
    )
    .bind(collection)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list collection {}", collection))?;

    rows.iter().map(row_to_document_mysql).collect()
}

async fn get_document_mysql(
    pool: &MySqlPool,
    collection: &str,
    id: &str,
) -> Result<Option<Document>> {
    let row = sqlx::query(
        r#"
        SELECT id, fields, created_at, updated_at
        FROM documents
        WHERE collection = ? AND id = ?
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get document {}/{}", collection, id))?;

    row.as_ref().map(row_to_document_mysql).transpose()
}

async fn insert_document_mysql(
    pool: &MySqlPool,
    collection: &str,
    document: &Document,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, fields, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(collection)
    .bind(&document.id)
    .bind(encode_fields(&document.fields)?)
    .bind(document.created_at)
    .bind(document.updated_at)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to create document in {}", collection))?;

    Ok(())
}

async fn merge_document_mysql(
    pool: &MySqlPool,
    collection: &str,
    id: &str,
    patch: Fields,
    upsert: bool,
) -> Result<Option<Document>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        r#"
        SELECT id, fields, created_at, updated_at
        FROM documents
        WHERE collection = ? AND id = ?
        FOR UPDATE
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .with_context(|| format!("Failed to read document {}/{}", collection, id))?;

    let document = match row {
        Some(row) => {
            let mut document = row_to_document_mysql(&row)?;
            document.merge(patch);
            sqlx::query(
                "UPDATE documents SET fields = ?, updated_at = ? WHERE collection = ? AND id = ?",
            )
            .bind(encode_fields(&document.fields)?)
            .bind(document.updated_at)
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to update document {}/{}", collection, id))?;
            document
        }
        None if upsert => {
            let mut fields = Fields::new();
            merge_fields(&mut fields, patch);
            let document = Document::new(id, fields);
            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, fields, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(collection)
            .bind(id)
            .bind(encode_fields(&document.fields)?)
            .bind(document.created_at)
            .bind(document.updated_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to create document {}/{}", collection, id))?;
            document
        }
        None => return Ok(None),
    };

    tx.commit().await.context("Failed to commit transaction")?;
    Ok(Some(document))
}

async fn delete_document_mysql(pool: &MySqlPool, collection: &str, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete document {}/{}", collection, id))?;

    Ok(result.rows_affected() > 0)
}

async fn delete_all_documents_mysql(pool: &MySqlPool, collection: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = ?")
        .bind(collection)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to clear collection {}", collection))?;

    Ok(result.rows_affected())
}

fn row_to_document_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Document> {
    let id: String = row.get("id");
    let raw: String = row.get("fields");
    Ok(Document {
        fields: decode_fields(&raw, &id)?,
        id,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use serde_json::{json, Value};

    async fn setup_test_repo() -> SqlxDocumentRepository {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxDocumentRepository::new(pool)
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;

        let created = repo
            .create("gallery", fields(json!({"title": "Painting"})))
            .await
            .expect("Failed to create");
        let fetched = repo
            .get("gallery", &created.id)
            .await
            .expect("Failed to get")
            .expect("Document should exist");

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.fields["title"], "Painting");
    }

    #[tokio::test]
    async fn test_get_missing_and_other_collection() {
        let repo = setup_test_repo().await;
        let created = repo
            .create("gallery", fields(json!({"title": "Painting"})))
            .await
            .unwrap();

        assert!(repo.get("gallery", "missing").await.unwrap().is_none());
        assert!(repo.get("classes", &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_in_insertion_order() {
        let repo = setup_test_repo().await;
        for title in ["first", "second", "third"] {
            repo.create("news-events", fields(json!({ "title": title })))
                .await
                .unwrap();
        }
        repo.create("gallery", fields(json!({"title": "elsewhere"})))
            .await
            .unwrap();

        let titles: Vec<_> = repo
            .list("news-events")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.fields["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_update_merges_top_level_fields() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(
                "news-events",
                fields(json!({"title": "Old", "author": "Jane Doe"})),
            )
            .await
            .unwrap();

        let found = repo
            .update("news-events", &created.id, fields(json!({"title": "New"})))
            .await
            .unwrap();
        assert!(found);

        let doc = repo.get("news-events", &created.id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "New");
        assert_eq!(doc.fields["author"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_update_missing_returns_false() {
        let repo = setup_test_repo().await;
        let found = repo
            .update("classes", "nope", fields(json!({"classname": "X"})))
            .await
            .unwrap();
        assert!(!found);
        assert!(repo.list("classes").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_creates_then_merges() {
        let repo = setup_test_repo().await;

        let created = repo
            .set("classes", "smart-lions", fields(json!({"classname": "Smart Lions"})))
            .await
            .unwrap();
        assert_eq!(created.id, "smart-lions");

        repo.set("classes", "smart-lions", fields(json!({"ageRange": "3-4"})))
            .await
            .unwrap();

        let doc = repo.get("classes", "smart-lions").await.unwrap().unwrap();
        assert_eq!(doc.fields["classname"], "Smart Lions");
        assert_eq!(doc.fields["ageRange"], "3-4");
        assert_eq!(repo.list("classes").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_test_repo().await;
        let created = repo
            .create("gallery", fields(json!({"title": "x"})))
            .await
            .unwrap();

        assert!(repo.delete("gallery", &created.id).await.unwrap());
        assert!(!repo.delete("gallery", &created.id).await.unwrap());
        assert!(repo.get("gallery", &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_all_empties_only_that_collection() {
        let repo = setup_test_repo().await;
        for i in 0..3 {
            repo.create("news-events", fields(json!({ "n": i })))
                .await
                .unwrap();
        }
        repo.create("gallery", fields(json!({"title": "keep"})))
            .await
            .unwrap();

        let removed = repo.delete_all("news-events").await.unwrap();
        assert_eq!(removed, 3);
        assert!(repo.list("news-events").await.unwrap().is_empty());
        assert_eq!(repo.list("gallery").await.unwrap().len(), 1);
    }
}
