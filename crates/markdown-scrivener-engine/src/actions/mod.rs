//! # Keyboard Actions
//!
//! Host-pluggable key handlers that run before native input.
//!
//! The registry asks each action in registration order whether it wants a
//! key; the first taker handles it. An action may still decline with
//! [`ActionOutcome::Pass`], in which case the key falls through to the
//! next match and finally to native input.
//!
//! ## Modules
//!
//! - **`builtin`**: the actions every editor starts with
//! - **`key`**: key press representation

pub mod builtin;
pub mod key;

use indexmap::IndexMap;

use crate::{
    editing::CursorHandle,
    error::TreeError,
    history::HistoryEntryType,
    tree::Surface,
};

pub use key::{Key, KeyInput};

/// What an action gets to work with.
pub struct ActionContext<'a> {
    pub surface: &'a mut Surface,
    pub cursor: &'a mut CursorHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Declined after all; keep looking.
    Pass,
    /// Only the caret moved.
    Moved,
    /// The document changed; record it as this kind of edit.
    Edited(HistoryEntryType),
    Undo,
    Redo,
}

pub trait Action {
    /// Cheap check run for every key press.
    fn can_handle(&self, key: &KeyInput, ctx: &ActionContext<'_>) -> bool;

    fn handle(
        &mut self,
        key: &KeyInput,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError>;
}

/// Actions by name, in registration order.
#[derive(Default)]
pub struct ActionRegistry {
    actions: IndexMap<String, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry holding every built-in action.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Adds `action` under `name`. Re-registering a name replaces the
    /// action but keeps its position.
    pub fn register(&mut self, name: impl Into<String>, action: Box<dyn Action>) {
        self.actions.insert(name.into(), action);
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.actions.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Names of the actions willing to take `key`, in order.
    pub fn matching(&self, key: &KeyInput, ctx: &ActionContext<'_>) -> Vec<String> {
        self.actions
            .iter()
            .filter(|(_, action)| action.can_handle(key, ctx))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn run(
        &mut self,
        name: &str,
        key: &KeyInput,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, TreeError> {
        match self.actions.get_mut(name) {
            Some(action) => action.handle(key, ctx),
            None => Ok(ActionOutcome::Pass),
        }
    }

    /// Runs the first matching action that does not pass.
    pub fn dispatch(
        &mut self,
        key: &KeyInput,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Option<(String, ActionOutcome)>, TreeError> {
        for name in self.matching(key, ctx) {
            match self.run(&name, key, ctx)? {
                ActionOutcome::Pass => continue,
                outcome => return Ok(Some((name, outcome))),
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.actions.keys()).finish()
    }
}
