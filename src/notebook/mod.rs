//! Notebooks — ephemeral per-session state.
//!
//! A notebook bundles the sources a teacher has added and the chat
//! transcript over them. Everything lives in process memory and is
//! discarded when the process exits; there is no persistence layer.
//!
//! The store is a single `Mutex<HashMap<..>>`. The lock is never held across
//! an `.await`: chat copies what it needs out, calls the LLM unlocked, and
//! re-acquires the lock to append the reply.

mod chat;

pub use chat::{CHAT_NO_ANSWER, CHAT_NO_SOURCES};

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::llm::MediaUrl;
use crate::sources::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub media: Vec<MediaUrl>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            media: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notebook {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sources: Vec<Source>,
    pub messages: Vec<ChatMessage>,
}

impl Notebook {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sources: Vec::new(),
            messages: Vec::new(),
        }
    }

    fn source_mut(&mut self, source_id: Uuid) -> Result<&mut Source, AppError> {
        self.sources
            .iter_mut()
            .find(|s| s.id == source_id)
            .ok_or_else(|| AppError::NotFound(format!("source {source_id}")))
    }
}

/// Process-wide notebook registry.
#[derive(Debug, Default)]
pub struct NotebookStore {
    notebooks: Mutex<HashMap<Uuid, Notebook>>,
}

impl NotebookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Notebook>>, AppError> {
        self.notebooks
            .lock()
            .map_err(|_| AppError::Server("notebook store lock poisoned".into()))
    }

    /// Run `f` against notebook `id` under the lock.
    fn with<T>(&self, id: Uuid, f: impl FnOnce(&mut Notebook) -> Result<T, AppError>) -> Result<T, AppError> {
        let mut map = self.lock()?;
        let nb = map
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("notebook {id}")))?;
        f(nb)
    }

    pub fn create(&self) -> Result<Uuid, AppError> {
        let nb = Notebook::new();
        let id = nb.id;
        self.lock()?.insert(id, nb);
        info!(notebook_id = %id, "notebook created");
        Ok(id)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.lock()?
            .remove(&id)
            .map(|_| info!(notebook_id = %id, "notebook deleted"))
            .ok_or_else(|| AppError::NotFound(format!("notebook {id}")))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Sources ───────────────────────────────────────────────────────────────

    pub fn add_source(&self, id: Uuid, source: Source) -> Result<Source, AppError> {
        self.with(id, |nb| {
            info!(notebook_id = %id, source_id = %source.id, kind = ?source.kind, "source added");
            nb.sources.push(source.clone());
            Ok(source)
        })
    }

    pub fn list_sources(&self, id: Uuid) -> Result<Vec<Source>, AppError> {
        self.with(id, |nb| Ok(nb.sources.clone()))
    }

    /// Flip `is_selected` and return the new state.
    pub fn toggle_source(&self, id: Uuid, source_id: Uuid) -> Result<bool, AppError> {
        self.with(id, |nb| {
            let s = nb.source_mut(source_id)?;
            s.is_selected = !s.is_selected;
            Ok(s.is_selected)
        })
    }

    pub fn set_selected(&self, id: Uuid, source_id: Uuid, selected: bool) -> Result<(), AppError> {
        self.with(id, |nb| {
            nb.source_mut(source_id)?.is_selected = selected;
            Ok(())
        })
    }

    pub fn remove_source(&self, id: Uuid, source_id: Uuid) -> Result<(), AppError> {
        self.with(id, |nb| {
            let before = nb.sources.len();
            nb.sources.retain(|s| s.id != source_id);
            if nb.sources.len() == before {
                return Err(AppError::NotFound(format!("source {source_id}")));
            }
            Ok(())
        })
    }

    pub(crate) fn selected_sources(&self, id: Uuid) -> Result<Vec<Source>, AppError> {
        self.with(id, |nb| Ok(nb.sources.iter().filter(|s| s.is_selected).cloned().collect()))
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    /// Messages in insertion order.
    pub fn history(&self, id: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        self.with(id, |nb| Ok(nb.messages.clone()))
    }

    pub fn clear_history(&self, id: Uuid) -> Result<(), AppError> {
        self.with(id, |nb| {
            nb.messages.clear();
            Ok(())
        })
    }

    pub(crate) fn push_message(&self, id: Uuid, message: ChatMessage) -> Result<ChatMessage, AppError> {
        self.with(id, |nb| {
            nb.messages.push(message.clone());
            Ok(message)
        })
    }

    /// Attach generated media to an existing message.
    pub fn attach_media(&self, id: Uuid, message_id: Uuid, media: MediaUrl) -> Result<ChatMessage, AppError> {
        self.with(id, |nb| {
            let msg = nb
                .messages
                .iter_mut()
                .find(|m| m.id == message_id)
                .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))?;
            msg.media.push(media);
            Ok(msg.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MediaKind;
    use crate::sources::{SourceKind, text_source};

    fn store_with_notebook() -> (NotebookStore, Uuid) {
        let store = NotebookStore::new();
        let id = store.create().unwrap();
        (store, id)
    }

    #[test]
    fn create_and_delete() {
        let (store, id) = store_with_notebook();
        assert_eq!(store.len(), 1);
        store.delete(id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.delete(id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn unknown_notebook_is_not_found() {
        let store = NotebookStore::new();
        assert!(matches!(store.list_sources(Uuid::new_v4()), Err(AppError::NotFound(_))));
    }

    #[test]
    fn toggle_flips_selection() {
        let (store, id) = store_with_notebook();
        let src = store.add_source(id, text_source("a", "alpha").unwrap()).unwrap();
        assert!(!store.toggle_source(id, src.id).unwrap());
        assert!(store.selected_sources(id).unwrap().is_empty());
        assert!(store.toggle_source(id, src.id).unwrap());
        assert_eq!(store.selected_sources(id).unwrap().len(), 1);
    }

    #[test]
    fn set_selected_and_remove() {
        let (store, id) = store_with_notebook();
        let a = store.add_source(id, text_source("a", "alpha").unwrap()).unwrap();
        let b = store.add_source(id, Source::new("b.pdf", "beta", SourceKind::Pdf)).unwrap();
        store.set_selected(id, a.id, false).unwrap();
        let selected = store.selected_sources(id).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, b.id);

        store.remove_source(id, b.id).unwrap();
        assert_eq!(store.list_sources(id).unwrap().len(), 1);
        assert!(matches!(store.remove_source(id, b.id), Err(AppError::NotFound(_))));
        assert!(matches!(store.toggle_source(id, b.id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn history_keeps_order_and_clears() {
        let (store, id) = store_with_notebook();
        store.push_message(id, ChatMessage::new(Role::User, "one")).unwrap();
        store.push_message(id, ChatMessage::new(Role::Assistant, "two")).unwrap();
        let h = store.history(id).unwrap();
        assert_eq!(h.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(), vec!["one", "two"]);
        store.clear_history(id).unwrap();
        assert!(store.history(id).unwrap().is_empty());
    }

    #[test]
    fn media_attaches_to_message() {
        let (store, id) = store_with_notebook();
        let msg = store.push_message(id, ChatMessage::new(Role::Assistant, "story")).unwrap();
        let media = MediaUrl { kind: MediaKind::Image, url: "data:image/png;base64,AA==".into() };
        let updated = store.attach_media(id, msg.id, media.clone()).unwrap();
        assert_eq!(updated.media, vec![media]);
        assert!(store.attach_media(id, Uuid::new_v4(), updated.media[0].clone()).is_err());
    }

    #[test]
    fn message_role_serialises_lowercase() {
        let v = serde_json::to_value(ChatMessage::new(Role::Assistant, "hi")).unwrap();
        assert_eq!(v["role"], "assistant");
        assert!(v["media"].as_array().unwrap().is_empty());
    }
}
