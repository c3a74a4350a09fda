//! The todo collection and the views derived from it.
//!
//! Pending/completed partitions and `Stats` are computed on demand from the
//! collection, so they cannot drift from it.

use serde::Serialize;

use crate::types::Todo;

/// Aggregate completion figures for a set of todos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Percentage in `0..=100`, rounded half up; 0 for an empty list.
    pub completion_rate: u32,
}

impl Stats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let total = todos.len();
        let completed = todos.iter().filter(|t| t.completed).count();
        let completion_rate = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate,
        }
    }
}

/// Ordered todo collection, newest first. Identifiers are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    todos: Vec<Todo>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full refresh from a server listing. Later duplicates of an id are dropped.
    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        self.todos.clear();
        for todo in todos {
            if self.get(&todo.id).is_none() {
                self.todos.push(todo);
            }
        }
    }

    /// Insert at the front, evicting any stale entry with the same id.
    pub fn prepend(&mut self, todo: Todo) {
        self.todos.retain(|t| t.id != todo.id);
        self.todos.insert(0, todo);
    }

    /// Swap in the server's version of a todo. Returns false if the id is unknown.
    pub fn replace(&mut self, todo: Todo) -> bool {
        match self.todos.iter_mut().find(|t| t.id == todo.id) {
            Some(slot) => {
                *slot = todo;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Todo> {
        let pos = self.todos.iter().position(|t| t.id == id)?;
        Some(self.todos.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn clear(&mut self) {
        self.todos.clear();
    }

    pub fn all(&self) -> &[Todo] {
        &self.todos
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn pending(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|t| !t.completed).collect()
    }

    pub fn completed(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|t| t.completed).collect()
    }

    pub fn stats(&self) -> Stats {
        Stats::from_todos(&self.todos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: &str, completed: bool) -> Todo {
        Todo {
            id: id.to_string(),
            title: format!("todo {id}"),
            note: None,
            category: None,
            priority: None,
            completed,
            time: None,
        }
    }

    fn assert_consistent(list: &TodoList) {
        let stats = list.stats();
        assert_eq!(stats.total, list.pending().len() + list.completed().len());
        assert_eq!(stats.pending, list.pending().len());
        assert_eq!(stats.completed, list.completed().len());
    }

    #[test]
    fn empty_list_has_zero_rate() {
        let list = TodoList::new();
        assert_eq!(list.stats(), Stats::default());
    }

    #[test]
    fn completion_rate_rounds_half_up() {
        let todos = [todo("1", true), todo("2", false), todo("3", false)];
        assert_eq!(Stats::from_todos(&todos).completion_rate, 33);
        let todos = [todo("1", true), todo("2", true), todo("3", false)];
        assert_eq!(Stats::from_todos(&todos).completion_rate, 67);
        let todos: Vec<_> = (0..8).map(|i| todo(&i.to_string(), i < 1)).collect();
        // 12.5%
        assert_eq!(Stats::from_todos(&todos).completion_rate, 13);
        let todos = [todo("1", true)];
        assert_eq!(Stats::from_todos(&todos).completion_rate, 100);
    }

    #[test]
    fn stats_stay_consistent_through_mutations() {
        let mut list = TodoList::new();
        for i in 0..6 {
            list.prepend(todo(&i.to_string(), false));
            assert_consistent(&list);
        }
        for id in ["1", "3", "4"] {
            let mut t = list.get(id).unwrap().clone();
            t.completed = !t.completed;
            assert!(list.replace(t));
            assert_consistent(&list);
        }
        list.remove("3");
        list.remove("0");
        assert_consistent(&list);
        assert_eq!(
            list.stats(),
            Stats {
                total: 4,
                completed: 2,
                pending: 2,
                completion_rate: 50,
            }
        );
    }

    #[test]
    fn prepend_puts_newest_first_and_keeps_ids_unique() {
        let mut list = TodoList::new();
        list.prepend(todo("a", false));
        list.prepend(todo("b", false));
        list.prepend(todo("a", true));
        let ids: Vec<_> = list.all().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(list.get("a").unwrap().completed);
    }

    #[test]
    fn replace_all_drops_duplicate_ids() {
        let mut list = TodoList::new();
        list.prepend(todo("old", false));
        list.replace_all(vec![todo("x", false), todo("y", true), todo("x", true)]);
        assert_eq!(list.len(), 2);
        assert!(list.get("old").is_none());
        assert!(!list.get("x").unwrap().completed);
    }

    #[test]
    fn replace_and_remove_unknown_ids() {
        let mut list = TodoList::new();
        list.prepend(todo("a", false));
        assert!(!list.replace(todo("zzz", true)));
        assert!(list.remove("zzz").is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let json = serde_json::to_value(Stats::from_todos(&[todo("1", true)])).unwrap();
        assert_eq!(json["completionRate"], 100);
    }
}
