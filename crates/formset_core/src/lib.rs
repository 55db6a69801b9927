//! Client-side lifecycle of a dynamic formset.
//!
//! A [`FormsetController`] owns one container of repeated sub-form rows. It
//! stamps new rows out of the container's empty-row template, removes rows,
//! keeps the row indices dense after every removal, and keeps the
//! `TOTAL_FORMS` counter equal to the number of mounted rows so the
//! submitted form always satisfies the server's formset protocol.

use std::collections::{BTreeMap, HashSet};

use shared::{
    domain::{FieldKey, Prefix, RowHandle, RowIndex, RowState},
    error::{FormsetError, IntegrityError, MarkupError},
    protocol::{ManagementForm, Submission, DEFAULT_MAX_NUM_FORMS},
};
use tracing::{debug, warn};

pub mod builder;
pub mod config;
pub mod events;
pub mod ident;
pub mod markup;
pub mod render;
pub mod row;
pub mod template;

pub use builder::{FieldSpec, InputKind, TemplateBuilder};
pub use config::{ControlClasses, FormsetConfig};
pub use events::{ControlEvent, ControlRole, DispatchOutcome, EventBindings};
pub use markup::{Element, Node};
pub use render::{render_container, render_node, RenderOptions};
pub use row::{Row, RowOrigin};
pub use template::Template;

/// Server-rendered state the controller takes ownership of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMarkup {
    /// Value of the `TOTAL_FORMS` counter field as rendered.
    pub total_forms: usize,
    /// Value of the `INITIAL_FORMS` field: how many leading rows exist on the server.
    pub initial_forms: usize,
    pub rows: Vec<Node>,
    pub template: Node,
}

impl ContainerMarkup {
    pub fn new(template: Node) -> Self {
        Self {
            total_forms: 0,
            initial_forms: 0,
            rows: Vec::new(),
            template,
        }
    }

    /// Appends a server-rendered row and bumps the rendered counter with it.
    pub fn with_row(mut self, row: Node) -> Self {
        self.rows.push(row);
        self.total_forms = self.rows.len();
        self
    }

    pub fn with_initial_forms(mut self, initial_forms: usize) -> Self {
        self.initial_forms = initial_forms;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAffordance {
    pub handle: RowHandle,
    pub index: RowIndex,
    pub serial: usize,
    pub removable: bool,
}

/// Visible state of the controls, recomputed after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordances {
    pub add_visible: bool,
    pub rows: Vec<RowAffordance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added { handle: RowHandle, index: RowIndex },
    /// The counter already equals `max_num`; nothing changed.
    AtMaximum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed {
        /// The detached row, in the `Removed` state.
        row: Box<Row>,
        /// How many remaining rows moved to a new index.
        renumbered: usize,
    },
    /// The row count already equals `min_num`; nothing changed.
    AtMinimum,
    /// The row sits below `min_num` and cannot be removed.
    Protected,
    /// The handle does not belong to a mounted row.
    UnknownRow,
}

#[derive(Debug)]
pub struct FormsetController {
    config: FormsetConfig,
    template: Template,
    rows: Vec<Row>,
    counter: usize,
    next_handle: usize,
    bindings: EventBindings,
    affordances: Affordances,
}

impl FormsetController {
    pub fn new(config: FormsetConfig, container: ContainerMarkup) -> Result<Self, FormsetError> {
        config.validate()?;

        let template = Template::new(
            container.template,
            config.prefix.clone(),
            config.placeholder.clone(),
            config.classes.clone(),
        )?;

        let mut adopted = Vec::with_capacity(container.rows.len());
        let mut seen = HashSet::new();
        for (position, node) in container.rows.iter().enumerate() {
            let (markup, index) =
                row::RowMarkup::adopt(node, &config.prefix, &config.classes, position)?;
            if !seen.insert(index) {
                return Err(MarkupError::DuplicateRowIndex { index }.into());
            }
            let origin = if position < container.initial_forms {
                RowOrigin::Initial
            } else {
                RowOrigin::Extra
            };
            adopted.push((markup, index, origin));
        }

        if container.total_forms != adopted.len() {
            warn!(
                prefix = %config.prefix,
                counter = container.total_forms,
                rows = adopted.len(),
                "formset counter out of sync with rendered rows; using row count"
            );
        }
        if config.max_num.is_some_and(|max_num| adopted.len() > max_num) {
            warn!(
                prefix = %config.prefix,
                rows = adopted.len(),
                max_num = ?config.max_num,
                "server rendered more rows than max_num; adding stays refused"
            );
        }

        let mut controller = Self {
            config,
            template,
            rows: Vec::with_capacity(adopted.len()),
            counter: 0,
            next_handle: 0,
            bindings: EventBindings::standard(),
            affordances: Affordances {
                add_visible: true,
                rows: Vec::new(),
            },
        };

        for (markup, index, origin) in adopted {
            let handle = controller.allocate_handle();
            let mut row = Row::new(handle, index, origin, markup);
            row.set_state(RowState::Mounted);
            controller.rows.push(row);
        }

        // Server rows may arrive with gaps; settle them before the first refresh.
        let renumbered = controller.renumber();
        if renumbered > 0 {
            warn!(
                prefix = %controller.config.prefix,
                renumbered,
                "server-rendered rows were not densely indexed"
            );
        }
        controller.counter = controller.rows.len();
        controller.refresh();

        Ok(controller)
    }

    pub fn config(&self) -> &FormsetConfig {
        &self.config
    }

    pub fn prefix(&self) -> &Prefix {
        &self.config.prefix
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Current value of the `TOTAL_FORMS` counter.
    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, handle: RowHandle) -> Option<&Row> {
        self.rows.iter().find(|row| row.handle() == handle)
    }

    pub fn handle_at(&self, index: RowIndex) -> Option<RowHandle> {
        self.rows.get(index.0).map(Row::handle)
    }

    pub fn affordances(&self) -> &Affordances {
        &self.affordances
    }

    pub fn bindings_mut(&mut self) -> &mut EventBindings {
        &mut self.bindings
    }

    /// Appends a row stamped from the template, unless the counter is at `max_num`.
    pub fn add_row(&mut self) -> AddOutcome {
        if self.config.is_at_ceiling(self.counter) {
            debug!(
                prefix = %self.config.prefix,
                rows = self.rows.len(),
                "add refused: formset at max_num"
            );
            return AddOutcome::AtMaximum;
        }

        let index = RowIndex(self.counter);
        let markup = self.template.instantiate(index);
        let handle = self.allocate_handle();
        let mut row = Row::new(handle, index, RowOrigin::Extra, markup);
        row.set_state(RowState::Mounted);
        self.rows.push(row);
        self.counter += 1;
        self.refresh();

        debug!(
            prefix = %self.config.prefix,
            index = index.0,
            rows = self.rows.len(),
            "formset row added"
        );
        AddOutcome::Added { handle, index }
    }

    /// Detaches `handle` and renumbers the rows that remain.
    pub fn remove_row(&mut self, handle: RowHandle) -> RemoveOutcome {
        let floor = self.config.floor();
        if self.rows.len() <= floor {
            debug!(
                prefix = %self.config.prefix,
                rows = self.rows.len(),
                "remove refused: formset at min_num"
            );
            return RemoveOutcome::AtMinimum;
        }

        let Some(position) = self.rows.iter().position(|row| row.handle() == handle) else {
            debug!(prefix = %self.config.prefix, handle = handle.0, "remove ignored: unknown row");
            return RemoveOutcome::UnknownRow;
        };
        if position < floor {
            debug!(
                prefix = %self.config.prefix,
                index = position,
                "remove refused: row is protected by min_num"
            );
            return RemoveOutcome::Protected;
        }

        let mut row = self.rows.remove(position);
        row.set_state(RowState::Removed);
        let renumbered = self.renumber();
        self.counter = self.rows.len();
        self.refresh();

        debug!(
            prefix = %self.config.prefix,
            index = row.index().0,
            renumbered,
            rows = self.rows.len(),
            "formset row removed"
        );
        RemoveOutcome::Removed {
            row: Box::new(row),
            renumbered,
        }
    }

    pub fn remove_at(&mut self, index: RowIndex) -> RemoveOutcome {
        match self.handle_at(index) {
            Some(handle) => self.remove_row(handle),
            None => RemoveOutcome::UnknownRow,
        }
    }

    /// Routes a control event through this controller's binding table.
    pub fn dispatch(&mut self, event: ControlEvent) -> DispatchOutcome {
        let ControlEvent::Click { role, row } = event;
        let Some(handler) = self.bindings.handler(role) else {
            debug!(prefix = %self.config.prefix, role = role.name(), "no handler bound");
            return DispatchOutcome::Ignored;
        };
        debug!(prefix = %self.config.prefix, role = role.name(), "dispatching control click");
        handler(self, row)
    }

    /// Recomputes control visibility and serial numbers from the registry.
    pub fn refresh(&mut self) -> &Affordances {
        let floor = self.config.floor();
        let add_visible = !self.config.is_at_ceiling(self.counter);
        let rows = self
            .rows
            .iter_mut()
            .map(|row| {
                row.set_state(RowState::Indexed);
                RowAffordance {
                    handle: row.handle(),
                    index: row.index(),
                    serial: row.index().serial(),
                    removable: row.index().0 >= floor,
                }
            })
            .collect();

        self.affordances = Affordances { add_visible, rows };
        &self.affordances
    }

    /// Sets the submitted value of field `key` in row `handle`.
    pub fn set_value(&mut self, handle: RowHandle, key: &FieldKey, value: &str) -> bool {
        self.rows
            .iter_mut()
            .find(|row| row.handle() == handle)
            .is_some_and(|row| row.markup_mut().set_value(key, value))
    }

    /// Concrete markup of every mounted row, in order.
    pub fn project_rows(&self) -> Vec<Node> {
        self.rows
            .iter()
            .zip(&self.affordances.rows)
            .filter_map(|(row, affordance)| row.project(&self.config.prefix, affordance.removable))
            .collect()
    }

    pub fn management_form(&self) -> ManagementForm {
        let initial_forms = self
            .rows
            .iter()
            .filter(|row| row.origin() == RowOrigin::Initial)
            .count();
        ManagementForm {
            total_forms: self.counter,
            initial_forms,
            min_num_forms: self.config.floor(),
            max_num_forms: self.config.max_num.unwrap_or(DEFAULT_MAX_NUM_FORMS),
        }
    }

    /// The payload the server would receive if the parent form were submitted now.
    pub fn submission(&self) -> Submission {
        let fields: BTreeMap<String, String> = self
            .rows
            .iter()
            .flat_map(|row| row.fields(&self.config.prefix))
            .collect();
        Submission {
            prefix: self.config.prefix.clone(),
            management: self.management_form(),
            fields,
        }
    }

    /// Checks the formset invariants against the current registry.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        if self.counter != self.rows.len() {
            return Err(IntegrityError::CounterMismatch {
                counter: self.counter,
                rows: self.rows.len(),
            });
        }

        for (position, row) in self.rows.iter().enumerate() {
            if row.index().0 != position {
                return Err(IntegrityError::IndexGap {
                    position,
                    index: row.index(),
                });
            }
        }

        for (row, affordance) in self.rows.iter().zip(&self.affordances.rows) {
            if affordance.index != row.index() || affordance.serial != row.index().serial() {
                return Err(IntegrityError::SerialMismatch {
                    index: row.index(),
                    serial: affordance.serial,
                });
            }
            let projected = row.project(&self.config.prefix, affordance.removable);
            if projected.is_some_and(|node| node.contains(&self.config.placeholder)) {
                return Err(IntegrityError::StrayPlaceholder {
                    index: row.index(),
                    placeholder: self.config.placeholder.clone(),
                });
            }
        }

        Ok(())
    }

    fn allocate_handle(&mut self) -> RowHandle {
        let handle = RowHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Assigns `index = position` to every row. Returns how many rows moved.
    fn renumber(&mut self) -> usize {
        let mut moved = 0;
        for (position, row) in self.rows.iter_mut().enumerate() {
            if row.reindex(RowIndex(position)) {
                moved += 1;
            }
        }
        moved
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
