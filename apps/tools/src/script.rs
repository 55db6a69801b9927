//! Scripted control events replayed against a controller.

use std::str::FromStr;

use formset_core::{AddOutcome, ControlEvent, DispatchOutcome, FormsetController, RemoveOutcome};
use shared::domain::RowIndex;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Call `add_row` directly.
    Add,
    /// Call `remove_at` directly.
    Remove(usize),
    /// Route an add-control click through the binding table.
    ClickAdd,
    /// Route a click on the remove control of the row at this index.
    ClickRemove(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpParseError {
    #[error("unknown operation '{0}' (expected add, remove:<n>, click:add or click:remove:<n>)")]
    Unknown(String),
    #[error("invalid row index '{0}'")]
    BadIndex(String),
}

impl FromStr for Op {
    type Err = OpParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = |raw: &str| {
            raw.parse::<usize>()
                .map_err(|_| OpParseError::BadIndex(raw.to_string()))
        };
        match s.split(':').collect::<Vec<_>>().as_slice() {
            ["add"] => Ok(Op::Add),
            ["remove", raw] => index(*raw).map(Op::Remove),
            ["click", "add"] => Ok(Op::ClickAdd),
            ["click", "remove", raw] => index(*raw).map(Op::ClickRemove),
            _ => Err(OpParseError::Unknown(s.to_string())),
        }
    }
}

pub fn apply(controller: &mut FormsetController, ops: &[Op]) {
    for op in ops {
        match *op {
            Op::Add => log_add(controller.add_row()),
            Op::Remove(index) => log_remove(index, controller.remove_at(RowIndex(index))),
            Op::ClickAdd => match controller.dispatch(ControlEvent::add_clicked()) {
                DispatchOutcome::Added(outcome) => log_add(outcome),
                other => info!(?other, "add click had no effect"),
            },
            Op::ClickRemove(index) => {
                let Some(handle) = controller.handle_at(RowIndex(index)) else {
                    warn!(index, "no row to click remove on");
                    continue;
                };
                match controller.dispatch(ControlEvent::remove_clicked(handle)) {
                    DispatchOutcome::Removed(outcome) => log_remove(index, outcome),
                    other => info!(?other, "remove click had no effect"),
                }
            }
        }
    }
}

fn log_add(outcome: AddOutcome) {
    match outcome {
        AddOutcome::Added { index, .. } => info!(index = index.0, "row added"),
        AddOutcome::AtMaximum => info!("add refused at max_num"),
    }
}

fn log_remove(index: usize, outcome: RemoveOutcome) {
    match outcome {
        RemoveOutcome::Removed { renumbered, .. } => info!(index, renumbered, "row removed"),
        RemoveOutcome::AtMinimum => info!(index, "remove refused at min_num"),
        RemoveOutcome::Protected => info!(index, "remove refused for protected row"),
        RemoveOutcome::UnknownRow => warn!(index, "no row at index"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_operation_forms() {
        assert_eq!("add".parse::<Op>(), Ok(Op::Add));
        assert_eq!("remove:2".parse::<Op>(), Ok(Op::Remove(2)));
        assert_eq!("click:add".parse::<Op>(), Ok(Op::ClickAdd));
        assert_eq!("click:remove:0".parse::<Op>(), Ok(Op::ClickRemove(0)));
    }

    #[test]
    fn rejects_malformed_operations() {
        assert_eq!(
            "remove:x".parse::<Op>(),
            Err(OpParseError::BadIndex("x".into()))
        );
        assert_eq!(
            "drop".parse::<Op>(),
            Err(OpParseError::Unknown("drop".into()))
        );
    }
}
