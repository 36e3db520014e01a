//! Named actions and their handlers.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::context::ActionContext;
use crate::error::{BuildError, Result};

/// An action body.
pub type ActionHandler = Rc<dyn Fn(&mut ActionContext<'_>) -> Result<()>>;

/// A registered action.
#[derive(Clone)]
pub struct Action {
    pub name: String,
    pub description: String,
    /// Build class that registered this handler.
    pub class: String,
    pub handler: ActionHandler,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// Action name to handler.
///
/// Registering a name again replaces the earlier handler, so later build
/// classes override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` as `name` on behalf of `class`.
    pub fn register<F>(&mut self, class: &str, name: &str, description: &str, handler: F) -> Result<()>
    where
        F: Fn(&mut ActionContext<'_>) -> Result<()> + 'static,
    {
        if !is_valid_action_name(name) {
            return Err(BuildError::InvalidActionName {
                name: name.to_string(),
            });
        }

        if let Some(previous) = self.actions.get(name) {
            tracing::debug!(
                "Action '{}' from class '{}' overrides class '{}'",
                name,
                class,
                previous.class
            );
        }

        self.actions.insert(
            name.to_string(),
            Action {
                name: name.to_string(),
                description: description.to_string(),
                class: class.to_string(),
                handler: Rc::new(handler),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// The handler for `name`, cloned out of the registry.
    pub fn handler(&self, name: &str) -> Option<ActionHandler> {
        self.actions.get(name).map(|a| Rc::clone(&a.handler))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Action names are identifiers: letters, digits and underscores.
pub fn is_valid_action_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
