//! Record editor: the form state behind create/edit dialogs.
//!
//! Opening without a record starts from [`Draft::defaults`]; opening with one
//! copies it. Whether a save creates or updates is decided from the ids only
//! (the draft's own id first, then the id of the record the editor was opened
//! with), never from [`EditorMode`].
use std::future::Future;

use uuid::Uuid;

use crate::{EngineError, backend::ApiResult, guard::SubmitGuard};

/// A record that can be edited in an [`Editor`].
pub trait Draft: Clone {
    /// Fixed empty values used when creating a record.
    fn defaults() -> Self;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    /// Client-side checks, run before any request.
    fn validate(&self) -> Result<(), EngineError>;

    /// Fills the owner foreign key on the submitted copy, if the record has one.
    fn attach_owner(&mut self, _owner_id: &str) {}
}

/// Create/update calls of a [`Draft`] against a backend `A`.
pub trait Persist<A: ?Sized>: Draft {
    fn create<'a>(
        api: &'a A,
        draft: &'a Self,
        idempotency_key: &'a str,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a;

    fn update<'a>(
        api: &'a A,
        id: &'a str,
        draft: &'a Self,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveVerb {
    Create,
    Update(String),
}

/// Everything needed to run one save, detached from the editor so it can be
/// sent to a task.
#[derive(Debug, Clone)]
pub struct SaveTicket<D> {
    pub verb: SaveVerb,
    pub payload: D,
    pub idempotency_key: String,
}

impl<D> SaveTicket<D> {
    pub async fn submit<A>(self, api: &A) -> Result<D, EngineError>
    where
        A: Sync + ?Sized,
        D: Persist<A>,
    {
        let saved = match &self.verb {
            SaveVerb::Create => D::create(api, &self.payload, &self.idempotency_key).await,
            SaveVerb::Update(id) => D::update(api, id, &self.payload).await,
        };
        saved.map_err(EngineError::from)
    }
}

#[derive(Debug, Clone)]
pub struct Editor<D> {
    draft: D,
    original_id: Option<String>,
    mode: EditorMode,
    idempotency_key: String,
    guard: SubmitGuard,
    error: Option<String>,
}

impl<D: Draft> Editor<D> {
    pub fn open(existing: Option<D>) -> Self {
        let (draft, mode) = match existing {
            Some(record) => (record, EditorMode::Edit),
            None => (D::defaults(), EditorMode::Create),
        };
        let original_id = non_empty(draft.id()).map(str::to_string);
        Self {
            draft,
            original_id,
            mode,
            idempotency_key: Uuid::new_v4().to_string(),
            guard: SubmitGuard::default(),
            error: None,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut D {
        &mut self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn verb(&self) -> SaveVerb {
        match non_empty(self.draft.id()).or(self.original_id.as_deref()) {
            Some(id) => SaveVerb::Update(id.to_string()),
            None => SaveVerb::Create,
        }
    }

    /// Validates and locks the editor for one save.
    ///
    /// Fails without side effects on invalid input or while a save is
    /// already running.
    pub fn begin_save(&mut self, owner_id: Option<&str>) -> Result<SaveTicket<D>, EngineError> {
        if self.guard.is_busy() {
            return Err(EngineError::InFlight);
        }
        if let Err(err) = self.draft.validate() {
            self.error = Some(err.alert_message());
            return Err(err);
        }
        let verb = self.verb();
        let mut payload = self.draft.clone();
        if verb == SaveVerb::Create {
            payload.set_id(None);
        }
        if let Some(owner_id) = owner_id {
            payload.attach_owner(owner_id);
        }
        self.guard.try_start()?;
        self.error = None;
        Ok(SaveTicket {
            verb,
            payload,
            idempotency_key: self.idempotency_key.clone(),
        })
    }

    /// Unlocks the editor. On failure the draft is kept for a retry.
    pub fn finish_save(&mut self, result: Result<D, EngineError>) -> Result<D, EngineError> {
        self.guard.finish();
        match result {
            Ok(saved) => {
                if let Some(id) = non_empty(saved.id()) {
                    self.draft.set_id(Some(id.to_string()));
                }
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!(error = %err, "save failed");
                self.error = Some(err.alert_message());
                Err(err)
            }
        }
    }
}

fn non_empty(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}
