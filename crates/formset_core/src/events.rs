//! Control events and the per-controller table that routes them.

use shared::domain::RowHandle;

use crate::{AddOutcome, FormsetController, RemoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRole {
    Add,
    Remove,
}

impl ControlRole {
    pub fn name(self) -> &'static str {
        match self {
            ControlRole::Add => "add",
            ControlRole::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// A click on a control. `row` is the row the control sits in, if any.
    Click {
        role: ControlRole,
        row: Option<RowHandle>,
    },
}

impl ControlEvent {
    pub fn add_clicked() -> Self {
        ControlEvent::Click {
            role: ControlRole::Add,
            row: None,
        }
    }

    pub fn remove_clicked(row: RowHandle) -> Self {
        ControlEvent::Click {
            role: ControlRole::Remove,
            row: Some(row),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Added(AddOutcome),
    Removed(RemoveOutcome),
    /// No handler is bound to the role, or the event lacked a target row.
    Ignored,
}

pub type Handler = fn(&mut FormsetController, Option<RowHandle>) -> DispatchOutcome;

/// Role-to-handler table attached to one controller instance.
#[derive(Debug, Clone)]
pub struct EventBindings {
    table: Vec<(ControlRole, Handler)>,
}

impl EventBindings {
    pub fn empty() -> Self {
        Self { table: Vec::new() }
    }

    /// Binds `add` and `remove` to the controller's row operations.
    pub fn standard() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(ControlRole::Add, handle_add);
        bindings.bind(ControlRole::Remove, handle_remove);
        bindings
    }

    /// Installs `handler` for `role`, replacing any previous binding.
    pub fn bind(&mut self, role: ControlRole, handler: Handler) {
        match self.table.iter_mut().find(|(bound, _)| *bound == role) {
            Some(entry) => entry.1 = handler,
            None => self.table.push((role, handler)),
        }
    }

    pub fn unbind(&mut self, role: ControlRole) -> bool {
        let before = self.table.len();
        self.table.retain(|(bound, _)| *bound != role);
        self.table.len() != before
    }

    pub fn handler(&self, role: ControlRole) -> Option<Handler> {
        self.table
            .iter()
            .find(|(bound, _)| *bound == role)
            .map(|(_, handler)| *handler)
    }

    #[cfg(test)]
    fn roles(&self) -> impl Iterator<Item = ControlRole> + '_ {
        self.table.iter().map(|(role, _)| *role)
    }
}

impl Default for EventBindings {
    fn default() -> Self {
        Self::standard()
    }
}

fn handle_add(controller: &mut FormsetController, _row: Option<RowHandle>) -> DispatchOutcome {
    DispatchOutcome::Added(controller.add_row())
}

fn handle_remove(controller: &mut FormsetController, row: Option<RowHandle>) -> DispatchOutcome {
    match row {
        Some(handle) => DispatchOutcome::Removed(controller.remove_row(handle)),
        None => DispatchOutcome::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore(_: &mut FormsetController, _: Option<RowHandle>) -> DispatchOutcome {
        DispatchOutcome::Ignored
    }

    #[test]
    fn standard_table_binds_both_roles() {
        let bindings = EventBindings::standard();
        let roles: Vec<_> = bindings.roles().collect();
        assert_eq!(roles, vec![ControlRole::Add, ControlRole::Remove]);
    }

    #[test]
    fn bind_replaces_existing_entry() {
        let mut bindings = EventBindings::standard();
        bindings.bind(ControlRole::Add, ignore);
        assert_eq!(bindings.roles().count(), 2);
        assert!(bindings.unbind(ControlRole::Add));
        assert!(!bindings.unbind(ControlRole::Add));
        assert!(bindings.handler(ControlRole::Add).is_none());
        assert!(bindings.handler(ControlRole::Remove).is_some());
    }
}
