// User-facing session state tying the store and undo controller together

use crate::error::{TodoError, TodoResult};
use crate::filter::Filter;
use crate::models::Todo;
use crate::storage::Storage;
use crate::store::TodoStore;
use crate::undo::{DeleteUndoController, UndoView};
use tracing::warn;

/// Title being edited, and which todo it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCursor {
    pub id: String,
    pub text: String,
}

/// Everything a front end needs to render and drive the todo list
///
/// Each intent maps onto one store or controller operation. Failures leave
/// the state unchanged and are returned so the caller may show or ignore them.
pub struct Session<S: Storage> {
    store: TodoStore<S>,
    undo: DeleteUndoController,
    filter: Filter,
    editing: Option<EditCursor>,
}

impl<S: Storage> Session<S> {
    pub fn new(store: TodoStore<S>, undo: DeleteUndoController) -> Self {
        Self {
            store,
            undo,
            filter: Filter::default(),
            editing: None,
        }
    }

    pub fn store(&self) -> &TodoStore<S> {
        &self.store
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn editing(&self) -> Option<&EditCursor> {
        self.editing.as_ref()
    }

    /// Todos under the current filter
    pub fn visible(&self) -> Vec<&Todo> {
        self.store.filtered(self.filter)
    }

    pub fn undo_banner(&self) -> Option<UndoView> {
        self.undo.current_view()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn add(&mut self, text: &str) -> TodoResult<Todo> {
        self.store.create(text).inspect_err(log_absorbed)
    }

    /// Open the editor on a todo, seeded with its current title
    pub fn begin_edit(&mut self, id: &str) -> TodoResult<()> {
        let todo = self.store.get(id).ok_or_else(|| TodoError::not_found(id))?;
        self.editing = Some(EditCursor {
            id: todo.id.clone(),
            text: todo.title.clone(),
        });
        Ok(())
    }

    /// Replace the text in the open editor; ignored when none is open
    pub fn set_edit_text(&mut self, text: &str) {
        if let Some(cursor) = self.editing.as_mut() {
            cursor.text = text.to_string();
        }
    }

    /// Save the open editor
    ///
    /// The editor closes only when the save succeeds.
    pub fn save_edit(&mut self) -> TodoResult<()> {
        let cursor = self.editing.as_ref().ok_or(TodoError::InvalidState)?;
        self.store.edit(&cursor.id, &cursor.text).inspect_err(log_absorbed)?;
        self.editing = None;
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn toggle(&mut self, id: &str) -> TodoResult<()> {
        self.store.toggle_completion(id).inspect_err(log_absorbed)
    }

    /// Remove a todo and open its undo window
    pub fn delete(&mut self, id: &str, now: i64) -> TodoResult<()> {
        let removed = self.store.remove(id).inspect_err(log_absorbed)?;
        if self.editing.as_ref().is_some_and(|c| c.id == removed.id) {
            self.editing = None;
        }
        self.undo.arm(removed, now);
        Ok(())
    }

    /// Restore the pending deletion at the end of the list
    pub fn undo_delete(&mut self) -> TodoResult<Todo> {
        let todo = self
            .undo
            .pending()
            .map(|p| p.todo.clone())
            .ok_or(TodoError::InvalidState)
            .inspect_err(log_absorbed)?;

        // The pending slot and its timer stay untouched until the write succeeds
        self.store.reinsert(todo.clone()).inspect_err(log_absorbed)?;
        self.undo.undo()
    }

    pub fn clear_completed(&mut self) -> TodoResult<usize> {
        self.store.clear_completed().inspect_err(log_absorbed)
    }

    /// Pump the undo timer; returns a todo whose deletion just became permanent
    pub fn tick(&mut self, now: i64) -> Option<Todo> {
        self.undo.advance(now)
    }
}

fn log_absorbed(e: &TodoError) {
    warn!(error = %e, "Operation not performed");
}
