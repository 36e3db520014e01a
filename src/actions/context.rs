//! Per-dispatch action state.
//!
//! An [`ActionContext`] lives for one top-level dispatch. It owns the set
//! of actions already completed in that dispatch, so an action reached
//! through several dependency paths runs only once.

use std::collections::BTreeSet;

use crate::builder::Builder;
use crate::error::{BuildError, Result};
use crate::properties::{OverrideGuard, Properties, PropertyValue};

/// State threaded through action handlers during one dispatch.
pub struct ActionContext<'b> {
    builder: &'b mut Builder,
    completed: BTreeSet<String>,
}

impl<'b> ActionContext<'b> {
    /// Start a dispatch with nothing completed.
    pub fn new(builder: &'b mut Builder) -> Self {
        Self {
            builder,
            completed: BTreeSet::new(),
        }
    }

    pub fn builder(&self) -> &Builder {
        &*self.builder
    }

    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut *self.builder
    }

    /// Current property values, including active overrides.
    pub fn props(&self) -> &Properties {
        self.builder.props()
    }

    /// Whether `action` has already run in this dispatch.
    pub fn is_completed(&self, action: &str) -> bool {
        self.completed.contains(action)
    }

    /// Actions completed so far, sorted by name.
    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    /// Run `action` unless it already ran in this dispatch.
    ///
    /// The action's prerequisites are validated first, every time it is
    /// reached. An unknown action fails with [`BuildError::UnknownAction`].
    pub fn call_action(&mut self, action: &str) -> Result<()> {
        self.builder.validate_action_prereqs(action)?;

        if self.completed.contains(action) {
            tracing::debug!("Action '{}' already completed", action);
            return Ok(());
        }
        self.completed.insert(action.to_string());

        let handler = self
            .builder
            .actions()
            .handler(action)
            .ok_or_else(|| BuildError::UnknownAction {
                action: action.to_string(),
            })?;

        tracing::debug!("Running action '{}'", action);
        handler(self)
    }

    /// Run each action in order, stopping at the first failure.
    pub fn depends_on(&mut self, actions: &[&str]) -> Result<()> {
        for action in actions {
            self.call_action(action)?;
        }
        Ok(())
    }

    /// Apply property overrides until the returned guard is dropped.
    pub fn scoped(
        &mut self,
        overrides: Vec<(String, PropertyValue)>,
    ) -> Result<OverrideGuard<'_, Self>> {
        OverrideGuard::new(self, overrides)
    }

    /// Run `action` with scoped overrides, sharing this dispatch's
    /// completed set.
    pub fn dispatch(&mut self, action: &str, overrides: Vec<(String, PropertyValue)>) -> Result<()> {
        let mut scoped = self.scoped(overrides)?;
        scoped.call_action(action)
    }
}

impl AsMut<Properties> for ActionContext<'_> {
    fn as_mut(&mut self) -> &mut Properties {
        self.builder.props_mut()
    }
}
