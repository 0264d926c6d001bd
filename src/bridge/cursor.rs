//! Forward-only cursors over plan slots.

use std::vec;

use crate::{
    error::{CursorLevel, TraceMismatchError},
    plan::{ContainerRole, PlanNode},
};

/// Forward-only iterator over the slots below one plan node.
///
/// A cursor never rewinds or peeks; running dry is reported as a trace
/// mismatch naming the node whose slots were exhausted.
#[derive(Debug)]
pub(super) struct Cursor<'p> {
    parent: &'p PlanNode,
    level: CursorLevel,
    slots: vec::IntoIter<&'p PlanNode>,
}

impl<'p> Cursor<'p> {
    /// Cursor over the direct children of `parent`.
    pub(super) fn children(parent: &'p PlanNode, level: CursorLevel) -> Self {
        Self::over(parent, level, parent.children().iter().collect())
    }

    /// Cursor over the flattened step slots of a scenario.
    pub(super) fn steps(scenario: &'p PlanNode) -> Self {
        Self::over(scenario, CursorLevel::Step, scenario.step_slots())
    }

    /// Cursor over the example-row containers directly below a scenario.
    pub(super) fn examples(scenario: &'p PlanNode) -> Self {
        let rows = scenario
            .children()
            .iter()
            .filter(|child| child.has_role(ContainerRole::Example))
            .collect();
        Self::over(scenario, CursorLevel::Example, rows)
    }

    fn over(parent: &'p PlanNode, level: CursorLevel, slots: Vec<&'p PlanNode>) -> Self {
        Self {
            parent,
            level,
            slots: slots.into_iter(),
        }
    }

    /// Consume the next slot on behalf of `event`.
    pub(super) fn advance(&mut self, event: &'static str) -> Result<&'p PlanNode, TraceMismatchError> {
        self.slots
            .next()
            .ok_or_else(|| TraceMismatchError::CursorExhausted {
                event,
                level: self.level,
                parent: self.parent.label().to_owned(),
            })
    }

    /// Slots not yet consumed.
    pub(super) fn remaining(&self) -> usize { self.slots.len() }
}
