//! Edit session
//!
//! Holds the original record and a working copy. Setters only touch the
//! working copy; nothing reaches the gateway until [`EditSession::commit`].
//! A failed commit leaves the session open with the working copy intact.

use serde_json::Value;

use super::collection::{CollectionGateway, GatewayError, Record};
use crate::models::Fields;

/// How a commit reaches the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// `create`: the store assigns the id
    Create,
    /// `update`: merge into an existing record
    Update,
    /// `set`: merge, creating the record under its id when missing
    Upsert,
}

pub struct EditSession<R: Record> {
    gateway: CollectionGateway<R>,
    mode: EditMode,
    original: R,
    working: R,
    /// Fields sent on commit; `None` sends the whole working copy
    fields: Option<&'static [&'static str]>,
}

impl<R: Record + std::fmt::Debug> std::fmt::Debug for EditSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("mode", &self.mode)
            .field("original", &self.original)
            .field("working", &self.working)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl<R: Record> EditSession<R> {
    /// Start editing an existing record
    pub fn open(gateway: CollectionGateway<R>, record: R) -> Self {
        Self::with_mode(gateway, record, EditMode::Update)
    }

    /// Start a draft that becomes a new record on commit
    pub fn create(gateway: CollectionGateway<R>, draft: R) -> Self {
        Self::with_mode(gateway, draft, EditMode::Create)
    }

    /// Edit a record addressed by a known id that may not exist yet
    pub fn upsert(gateway: CollectionGateway<R>, record: R) -> Self {
        Self::with_mode(gateway, record, EditMode::Upsert)
    }

    fn with_mode(gateway: CollectionGateway<R>, record: R, mode: EditMode) -> Self {
        Self {
            gateway,
            mode,
            working: record.clone(),
            original: record,
            fields: None,
        }
    }

    /// Only send `fields` on commit
    pub fn restrict_to(mut self, fields: &'static [&'static str]) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn original(&self) -> &R {
        &self.original
    }

    pub fn working(&self) -> &R {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut R {
        &mut self.working
    }

    /// Apply a change to the working copy
    pub fn set(&mut self, change: impl FnOnce(&mut R)) {
        change(&mut self.working);
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.original
    }

    /// Overwrite working-copy fields from a JSON patch.
    ///
    /// Legacy field names are renamed first. Fields outside the session's
    /// editable set are rejected and leave the working copy untouched. `id`
    /// is ignored.
    pub fn apply_fields(&mut self, mut patch: Fields) -> Result<(), GatewayError> {
        patch.remove("id");
        R::canonicalize(&mut patch);
        if let Some(allowed) = self.fields {
            if let Some(key) = patch.keys().find(|k| !allowed.contains(&k.as_str())) {
                return Err(GatewayError::Validation(format!(
                    "Field '{}' cannot be edited here",
                    key
                )));
            }
        }

        let mut fields = self.working.to_fields().map_err(invalid)?;
        for (key, value) in patch {
            fields.insert(key, value);
        }
        fields.insert("id".to_string(), Value::String(self.working.id().to_string()));

        self.working = serde_json::from_value(Value::Object(fields)).map_err(invalid)?;
        Ok(())
    }

    /// Fields the next commit would send
    pub fn payload(&self) -> Result<Fields, GatewayError> {
        let all = self.working.to_fields().map_err(invalid)?;
        Ok(match self.fields {
            Some(allowed) => all
                .into_iter()
                .filter(|(k, _)| allowed.contains(&k.as_str()))
                .collect(),
            None => all,
        })
    }

    /// Validate and push the working copy through the gateway.
    ///
    /// On success the saved record becomes the new original and is returned
    /// so the caller can refresh its snapshot.
    pub async fn commit(&mut self) -> Result<R, GatewayError> {
        self.working.validate().map_err(GatewayError::Validation)?;
        let payload = self.payload()?;

        let saved = match self.mode {
            EditMode::Create => {
                let created = self.gateway.create_fields(payload).await?;
                self.mode = EditMode::Update;
                created
            }
            EditMode::Update => {
                let id = self.working.id().to_string();
                self.gateway.update(&id, payload).await?;
                self.gateway.get(&id).await?
            }
            EditMode::Upsert => {
                let id = self.working.id().to_string();
                self.gateway.set(&id, payload).await?
            }
        };

        tracing::debug!("Saved {}/{}", R::COLLECTION, saved.id());
        self.original = saved.clone();
        self.working = saved.clone();
        Ok(saved)
    }

    /// Drop the working copy without touching the gateway
    pub fn cancel(self) -> R {
        self.original
    }
}

fn invalid(e: serde_json::Error) -> GatewayError {
    GatewayError::Validation(format!("Invalid field value: {}", e))
}
