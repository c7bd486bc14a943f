// Todo collection with synchronous persistence

use crate::error::{TodoError, TodoResult};
use crate::filter::Filter;
use crate::models::{Todo, validate_title};
use crate::storage::Storage;
use tracing::{debug, info, warn};

/// Storage key holding the serialized collection
pub const TODOS_KEY: &str = "todos";

/// Authoritative, ordered todo collection backed by a [`Storage`]
///
/// Every mutation is persisted before it becomes visible. A mutation is
/// applied to a copy of the collection first, so a failed write leaves the
/// store exactly as it was.
pub struct TodoStore<S: Storage> {
    storage: S,
    todos: Vec<Todo>,
}

impl<S: Storage> TodoStore<S> {
    /// Open a store, restoring whatever the storage holds
    ///
    /// Missing state yields an empty list. Corrupt state is logged and also
    /// yields an empty list; it is overwritten on the first mutation.
    pub fn open(storage: S) -> TodoResult<Self> {
        let todos = match Self::load(&storage) {
            Ok(todos) => todos,
            Err(TodoError::StorageCorrupt(e)) => {
                warn!(error = %e, "Stored todos are corrupt, starting with an empty list");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self { storage, todos })
    }

    /// Read the persisted collection
    pub fn load(storage: &S) -> TodoResult<Vec<Todo>> {
        let raw = storage.get(TODOS_KEY).map_err(TodoError::Storage)?;

        let Some(raw) = raw else {
            debug!("No stored todos found");
            return Ok(Vec::new());
        };

        let todos: Vec<Todo> = serde_json::from_str(&raw).map_err(TodoError::StorageCorrupt)?;
        info!(count = todos.len(), "Loaded todos");

        Ok(todos)
    }

    /// All todos in collection order
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Look up a todo by id
    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new todo with the given title
    pub fn create(&mut self, title: &str) -> TodoResult<Todo> {
        validate_title(title)?;

        let todo = Todo::new(title);
        let mut next = self.todos.clone();
        next.push(todo.clone());
        self.commit(next)?;

        debug!(id = %todo.id, "Created todo");
        Ok(todo)
    }

    /// Replace the title of an existing todo
    pub fn edit(&mut self, id: &str, new_title: &str) -> TodoResult<()> {
        validate_title(new_title)?;

        let mut next = self.todos.clone();
        let todo = next.iter_mut().find(|t| t.id == id).ok_or_else(|| TodoError::not_found(id))?;
        todo.title = new_title.to_string();
        self.commit(next)
    }

    /// Flip the completed flag of a todo
    pub fn toggle_completion(&mut self, id: &str) -> TodoResult<()> {
        let mut next = self.todos.clone();
        let todo = next.iter_mut().find(|t| t.id == id).ok_or_else(|| TodoError::not_found(id))?;
        todo.completed = !todo.completed;
        self.commit(next)
    }

    /// Remove a todo and hand it to the caller
    pub fn remove(&mut self, id: &str) -> TodoResult<Todo> {
        let pos = self
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TodoError::not_found(id))?;

        let mut next = self.todos.clone();
        let removed = next.remove(pos);
        self.commit(next)?;

        debug!(id = %removed.id, "Removed todo");
        Ok(removed)
    }

    /// Append a previously removed todo at the end of the collection
    ///
    /// No id conflict check is made.
    pub fn reinsert(&mut self, todo: Todo) -> TodoResult<()> {
        let id = todo.id.clone();
        let mut next = self.todos.clone();
        next.push(todo);
        self.commit(next)?;

        debug!(id = %id, "Reinserted todo");
        Ok(())
    }

    /// Drop every completed todo, returning how many were removed
    pub fn clear_completed(&mut self) -> TodoResult<usize> {
        let next: Vec<Todo> = self.todos.iter().filter(|t| !t.completed).cloned().collect();
        let removed = self.todos.len() - next.len();
        self.commit(next)?;

        debug!(removed, "Cleared completed todos");
        Ok(removed)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Todos visible under a filter, in collection order
    pub fn filtered(&self, view: Filter) -> Vec<&Todo> {
        self.todos.iter().filter(|t| view.matches(t)).collect()
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn commit(&mut self, next: Vec<Todo>) -> TodoResult<()> {
        let json = serde_json::to_string(&next)
            .map_err(|e| TodoError::Storage(eyre::Report::new(e).wrap_err("Failed to serialize todos")))?;
        self.storage.set(TODOS_KEY, &json).map_err(TodoError::Storage)?;

        debug!(count = next.len(), "Persisted todos");
        self.todos = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use eyre::eyre;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn store_with(titles: &[&str]) -> TodoStore<MemoryStorage> {
        let mut store = TodoStore::open(MemoryStorage::new()).unwrap();
        for title in titles {
            store.create(title).unwrap();
        }
        store
    }

    fn titles(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|t| t.title.as_str()).collect()
    }

    fn reload<S: Storage>(store: &TodoStore<S>) -> Vec<Todo> {
        TodoStore::load(store.storage()).unwrap()
    }

    /// Storage whose writes can be made to fail
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: bool,
    }

    impl Storage for FlakyStorage {
        fn get(&self, key: &str) -> eyre::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> eyre::Result<()> {
            if self.fail_writes {
                return Err(eyre!("disk full"));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_open_empty_storage() {
        let store = TodoStore::open(MemoryStorage::new()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_storage() {
        let storage = MemoryStorage::new().with_entry(TODOS_KEY, "{not json");

        let result = TodoStore::load(&storage);
        assert!(matches!(result, Err(TodoError::StorageCorrupt(_))));

        // Opening falls back to an empty list
        let store = TodoStore::open(storage).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_restores_legacy_records() {
        let storage = MemoryStorage::new().with_entry(
            TODOS_KEY,
            r#"[{"id":"1700000000000","title":"Old","completed":true,"dueDate":null,"priority":"medium"}]"#,
        );

        let store = TodoStore::open(storage).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.todos()[0].id, "1700000000000");
        assert!(store.todos()[0].completed);
    }

    #[test]
    fn test_mutation_keeps_unrecognized_field_values() {
        let storage = MemoryStorage::new().with_entry(
            TODOS_KEY,
            r#"[{"id":"1","title":"Taxes","completed":false,"dueDate":"2025-04-15T10:00:00Z","priority":"urgent"}]"#,
        );
        let mut store = TodoStore::open(storage).unwrap();
        assert_eq!(store.len(), 1);

        store.toggle_completion("1").unwrap();

        let reloaded = reload(&store);
        assert_eq!(reloaded[0].priority, "urgent");
        assert_eq!(reloaded[0].due_date, Some(serde_json::json!("2025-04-15T10:00:00Z")));
        assert!(reloaded[0].completed);
    }

    #[test]
    fn test_create() {
        let mut store = store_with(&[]);

        let todo = store.create("Buy milk").unwrap();
        assert_eq!(todo.title, "Buy milk");
        assert!(!todo.completed);
        assert_eq!(todo.due_date, None);
        assert_eq!(store.todos(), std::slice::from_ref(&todo));

        // Verify persisted
        assert_eq!(reload(&store), vec![todo]);
    }

    #[test]
    fn test_create_rejects_invalid_titles() {
        let mut store = store_with(&["A"]);
        let before = store.todos().to_vec();

        let err = store.create(&"x".repeat(101)).unwrap_err();
        assert!(matches!(err, TodoError::Validation(_)));

        let err = store.create("   ").unwrap_err();
        assert!(matches!(err, TodoError::Validation(_)));

        assert_eq!(store.todos(), before.as_slice());
        assert_eq!(reload(&store), before);
    }

    #[test]
    fn test_create_ids_unique_and_ordered() {
        let mut store = store_with(&[]);
        for i in 0..200 {
            store.create(&format!("Task {}", i)).unwrap();
        }

        let ids: Vec<&str> = store.todos().iter().map(|t| t.id.as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 200);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_edit() {
        let mut store = store_with(&["A", "B"]);
        let id = store.todos()[1].id.clone();

        store.edit(&id, "B2").unwrap();
        assert_eq!(titles(store.todos()), vec!["A", "B2"]);
        assert_eq!(titles(&reload(&store)), vec!["A", "B2"]);
    }

    #[test]
    fn test_edit_errors_leave_state_unchanged() {
        let mut store = store_with(&["A"]);
        let id = store.todos()[0].id.clone();

        assert!(matches!(store.edit("missing", "X"), Err(TodoError::NotFound { .. })));
        assert!(matches!(store.edit(&id, ""), Err(TodoError::Validation(_))));
        assert!(matches!(store.edit(&id, &"y".repeat(101)), Err(TodoError::Validation(_))));

        assert_eq!(titles(store.todos()), vec!["A"]);
    }

    #[test]
    fn test_toggle_completion() {
        let mut store = store_with(&["A"]);
        let id = store.todos()[0].id.clone();

        store.toggle_completion(&id).unwrap();
        assert!(store.get(&id).unwrap().completed);
        assert!(reload(&store)[0].completed);

        store.toggle_completion(&id).unwrap();
        assert!(!store.get(&id).unwrap().completed);

        assert!(matches!(store.toggle_completion("missing"), Err(TodoError::NotFound { .. })));
    }

    #[test]
    fn test_remove_and_reinsert_appends() {
        let mut store = store_with(&["A", "B", "C"]);
        let id = store.todos()[0].id.clone();

        let removed = store.remove(&id).unwrap();
        assert_eq!(removed.title, "A");
        assert_eq!(titles(store.todos()), vec!["B", "C"]);
        assert_eq!(titles(&reload(&store)), vec!["B", "C"]);

        store.reinsert(removed.clone()).unwrap();
        assert_eq!(titles(store.todos()), vec!["B", "C", "A"]);
        assert_eq!(store.todos()[2], removed);
        assert_eq!(titles(&reload(&store)), vec!["B", "C", "A"]);

        assert!(matches!(store.remove("missing"), Err(TodoError::NotFound { .. })));
    }

    #[test]
    fn test_clear_completed_preserves_order() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        let ids: Vec<String> = store.todos().iter().map(|t| t.id.clone()).collect();
        store.toggle_completion(&ids[1]).unwrap();
        store.toggle_completion(&ids[3]).unwrap();

        let removed = store.clear_completed().unwrap();
        assert_eq!(removed, 2);
        assert_eq!(titles(store.todos()), vec!["A", "C"]);
        assert_eq!(titles(&reload(&store)), vec!["A", "C"]);

        // Nothing left to clear
        assert_eq!(store.clear_completed().unwrap(), 0);
    }

    #[test]
    fn test_filtered_partitions_all() {
        let mut store = store_with(&["A", "B", "C", "D", "E"]);
        let ids: Vec<String> = store.todos().iter().map(|t| t.id.clone()).collect();
        store.toggle_completion(&ids[0]).unwrap();
        store.toggle_completion(&ids[3]).unwrap();

        let all: Vec<&str> = store.filtered(Filter::All).iter().map(|t| t.id.as_str()).collect();
        let active: HashSet<&str> = store.filtered(Filter::Active).iter().map(|t| t.id.as_str()).collect();
        let completed: HashSet<&str> = store.filtered(Filter::Completed).iter().map(|t| t.id.as_str()).collect();

        assert_eq!(all.len(), 5);
        assert!(active.is_disjoint(&completed));
        let union: HashSet<&str> = active.union(&completed).copied().collect();
        let all_set: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(union, all_set);

        // Order preserved within a view
        let active_titles: Vec<&str> = store.filtered(Filter::Active).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(active_titles, vec!["B", "C", "E"]);
    }

    #[test]
    fn test_round_trip_after_mixed_operations() {
        let temp = TempDir::new().unwrap();
        let mut store = TodoStore::open(FileStorage::open(temp.path()).unwrap()).unwrap();

        let a = store.create("A").unwrap();
        let b = store.create("B").unwrap();
        let c = store.create("C").unwrap();
        store.edit(&b.id, "B edited").unwrap();
        store.toggle_completion(&c.id).unwrap();
        let removed = store.remove(&a.id).unwrap();
        store.create("D").unwrap();
        store.reinsert(removed).unwrap();

        let expected = store.todos().to_vec();
        drop(store);

        let reopened = TodoStore::open(FileStorage::open(temp.path()).unwrap()).unwrap();
        assert_eq!(reopened.todos(), expected.as_slice());
        assert_eq!(titles(reopened.todos()), vec!["B edited", "C", "D", "A"]);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let mut store = TodoStore::open(FlakyStorage::default()).unwrap();
        let a = store.create("A").unwrap();

        store.storage.fail_writes = true;

        assert!(matches!(store.create("B"), Err(TodoError::Storage(_))));
        assert!(matches!(store.remove(&a.id), Err(TodoError::Storage(_))));
        assert!(matches!(store.toggle_completion(&a.id), Err(TodoError::Storage(_))));

        assert_eq!(store.todos(), std::slice::from_ref(&a));
        assert!(!store.todos()[0].completed);
    }
}
