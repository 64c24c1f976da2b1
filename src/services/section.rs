//! Section controller
//!
//! Drives one management section (classes, news + events, gallery):
//!
//! ```text
//! Loading -> Loaded -> EditOpen -> Saving -> Loaded
//!                                        \-> Error -> EditOpen
//! Loaded -> Deleting -> Loaded
//! ```
//!
//! Search and category changes only touch local state. Every successful
//! write is followed by a full re-fetch. A failed fetch keeps the previous
//! snapshot and records the error instead of clearing the list.

use super::collection::{CollectionGateway, GatewayError, Record};
use super::edit::EditSession;
use super::view::{build_view, CategoryFilter, Searchable, ViewQuery};
use crate::models::{Fields, ListParams, PagedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Loading,
    Loaded,
    EditOpen,
    Saving,
    /// The last save failed; the edit session is still open
    Error,
    Deleting,
}

pub struct Section<R: Record + Searchable> {
    gateway: CollectionGateway<R>,
    state: SectionState,
    records: Vec<R>,
    query: ViewQuery,
    display_order: Option<Vec<String>>,
    edit: Option<EditSession<R>>,
    last_error: Option<String>,
}

impl<R: Record + Searchable> Section<R> {
    pub fn new(gateway: CollectionGateway<R>) -> Self {
        Self {
            gateway,
            state: SectionState::Loading,
            records: Vec::new(),
            query: ViewQuery::default(),
            display_order: None,
            edit: None,
            last_error: None,
        }
    }

    /// Sort the view by this fixed list of display names
    pub fn with_display_order(mut self, order: Vec<String>) -> Self {
        self.display_order = Some(order);
        self
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The full snapshot as last fetched
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Fetch the snapshot. Called once when the section becomes active.
    pub async fn activate(&mut self) -> Result<(), GatewayError> {
        self.state = SectionState::Loading;
        let result = self.refresh().await;
        self.state = SectionState::Loaded;
        result
    }

    async fn refresh(&mut self) -> Result<(), GatewayError> {
        match self.gateway.list().await {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", R::COLLECTION, e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.query.category = category;
    }

    /// Derived list for the current search, category and display order
    pub fn view(&self, params: &ListParams) -> PagedResult<R> {
        build_view(
            &self.records,
            &self.query,
            self.display_order.as_deref(),
            params,
        )
    }

    /// Open the edit dialog on a record with the section's editable fields
    pub async fn open_edit(&mut self, id: &str) -> Result<&mut EditSession<R>, GatewayError> {
        self.open_edit_with(id, R::EDIT_FIELDS).await
    }

    /// Open an editor that only writes `fields`.
    ///
    /// The record comes from the snapshot; records the listing hides are
    /// fetched by id.
    pub async fn open_edit_with(
        &mut self,
        id: &str,
        fields: &'static [&'static str],
    ) -> Result<&mut EditSession<R>, GatewayError> {
        self.ensure_idle()?;
        let cached = self.records.iter().find(|r| r.id() == id).cloned();
        let mut record = match cached {
            Some(record) => record,
            None => self.gateway.get(id).await?,
        };
        record.prepare_edit();
        let session = EditSession::open(self.gateway.clone(), record).restrict_to(fields);
        Ok(self.begin_edit(session))
    }

    /// Open the dialog on a new draft
    pub fn open_create(&mut self, draft: R) -> Result<&mut EditSession<R>, GatewayError> {
        self.ensure_idle()?;
        let session = EditSession::create(self.gateway.clone(), draft);
        Ok(self.begin_edit(session))
    }

    /// Open the dialog on a record addressed by a known id that may not
    /// exist yet
    pub fn open_upsert(&mut self, record: R) -> Result<&mut EditSession<R>, GatewayError> {
        self.ensure_idle()?;
        let session = EditSession::upsert(self.gateway.clone(), record);
        Ok(self.begin_edit(session))
    }

    fn begin_edit(&mut self, session: EditSession<R>) -> &mut EditSession<R> {
        self.state = SectionState::EditOpen;
        self.last_error = None;
        self.edit.insert(session)
    }

    /// Change the open edit; touching it clears a previous save error
    pub fn edit(&mut self, change: impl FnOnce(&mut R)) -> Result<(), GatewayError> {
        self.resume_edit()?.set(change);
        Ok(())
    }

    /// Merge a JSON patch into the open edit
    pub fn apply_fields(&mut self, patch: Fields) -> Result<(), GatewayError> {
        self.resume_edit()?.apply_fields(patch)
    }

    fn resume_edit(&mut self) -> Result<&mut EditSession<R>, GatewayError> {
        let session = self.edit.as_mut().ok_or_else(no_edit)?;
        if self.state == SectionState::Error {
            self.state = SectionState::EditOpen;
        }
        Ok(session)
    }

    /// Commit the open edit, close it and re-fetch.
    ///
    /// On failure the section moves to `Error` with the session kept open.
    pub async fn save(&mut self) -> Result<R, GatewayError> {
        let session = self.edit.as_mut().ok_or_else(no_edit)?;

        self.state = SectionState::Saving;
        match session.commit().await {
            Ok(saved) => {
                self.edit = None;
                self.last_error = None;
                // A failed re-fetch keeps the previous snapshot; the save
                // itself went through.
                let _ = self.refresh().await;
                self.state = SectionState::Loaded;
                Ok(saved)
            }
            Err(e) => {
                tracing::warn!("Saving {} failed: {}", R::COLLECTION, e);
                self.last_error = Some(e.to_string());
                self.state = SectionState::Error;
                Err(e)
            }
        }
    }

    /// Close the edit dialog without any gateway call
    pub fn cancel_edit(&mut self) -> Option<R> {
        let original = self.edit.take().map(EditSession::cancel);
        self.state = SectionState::Loaded;
        original
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), GatewayError> {
        self.ensure_idle()?;
        self.state = SectionState::Deleting;
        let result = self.gateway.delete(id).await;
        self.finish_delete(result).await
    }

    /// Delete the whole collection and re-fetch
    pub async fn delete_all(&mut self) -> Result<u64, GatewayError> {
        self.ensure_idle()?;
        self.state = SectionState::Deleting;
        let result = self.gateway.delete_all().await;
        self.finish_delete(result).await
    }

    async fn finish_delete<T>(&mut self, result: Result<T, GatewayError>) -> Result<T, GatewayError> {
        let result = match result {
            Ok(value) => {
                let _ = self.refresh().await;
                Ok(value)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        };
        self.state = SectionState::Loaded;
        result
    }

    fn ensure_idle(&self) -> Result<(), GatewayError> {
        match self.state {
            SectionState::Loaded => Ok(()),
            other => Err(GatewayError::Validation(format!(
                "Section is busy ({:?})",
                other
            ))),
        }
    }
}

fn no_edit() -> GatewayError {
    GatewayError::Validation("No edit in progress".to_string())
}
