//! Immutable test-plan tree.
//!
//! A [`Plan`] is built once per run by [`PlanBuilder`] and is only read
//! afterwards. Its nodes are either containers (root, stories, scenarios,
//! example rows, composite steps) or leaves (bookends, given-story slots,
//! executable steps). Every label in one plan is unique.

mod builder;

use std::fmt;

pub use builder::PlanBuilder;

use crate::{config::Granularity, error::PlanConstructionError};

/// Classification of a leaf, used by reporters to group results.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    /// `BeforeStories` / `AfterStories` slot.
    Bookend,
    /// A whole story at story granularity.
    Story,
    /// Reserved slot standing in for a given story.
    GivenStory,
    /// A step no registered candidate matches.
    Unknown,
    /// A step matched by a candidate of the named steps type.
    Steps(String),
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bookend => f.write_str("bookend"),
            Self::Story => f.write_str("story"),
            Self::GivenStory => f.write_str("given-story"),
            Self::Unknown => f.write_str("unknown"),
            Self::Steps(owner) => f.write_str(owner),
        }
    }
}

/// Structural role of a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerRole {
    /// Root of the plan.
    Suite,
    /// A story at step granularity.
    Story,
    /// A scenario.
    Scenario,
    /// One row of a scenario's examples table.
    Example,
    /// A composite step and its expansion.
    Composite,
}

/// A node of the plan tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanNode {
    /// Node grouping further nodes.
    Container {
        /// Unique display label.
        label: String,
        /// Structural role.
        role: ContainerRole,
        /// Children in execution order.
        children: Vec<PlanNode>,
    },
    /// Node reported as a single test.
    Leaf {
        /// Unique display label.
        label: String,
        /// Classification for reporting.
        owner: OwnerKind,
    },
}

impl PlanNode {
    /// Create an empty container.
    #[must_use]
    pub fn container(role: ContainerRole, label: impl Into<String>) -> Self {
        Self::Container {
            label: label.into(),
            role,
            children: Vec::new(),
        }
    }

    /// Create a leaf.
    #[must_use]
    pub fn leaf(owner: OwnerKind, label: impl Into<String>) -> Self {
        Self::Leaf {
            label: label.into(),
            owner,
        }
    }

    /// Append `child` to this container.
    ///
    /// # Errors
    ///
    /// Returns [`PlanConstructionError::LeafHasNoChildren`] when called on a
    /// leaf.
    pub fn add_child(&mut self, child: PlanNode) -> Result<(), PlanConstructionError> {
        match self {
            Self::Container { children, .. } => {
                children.push(child);
                Ok(())
            }
            Self::Leaf { label, .. } => Err(PlanConstructionError::LeafHasNoChildren {
                label: label.clone(),
            }),
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Container { label, .. } | Self::Leaf { label, .. } => label,
        }
    }

    /// Children of a container; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[PlanNode] {
        match self {
            Self::Container { children, .. } => children,
            Self::Leaf { .. } => &[],
        }
    }

    /// Role of a container; `None` for leaves.
    #[must_use]
    pub fn role(&self) -> Option<ContainerRole> {
        match self {
            Self::Container { role, .. } => Some(*role),
            Self::Leaf { .. } => None,
        }
    }

    /// Owner kind of a leaf; `None` for containers.
    #[must_use]
    pub fn owner_kind(&self) -> Option<&OwnerKind> {
        match self {
            Self::Leaf { owner, .. } => Some(owner),
            Self::Container { .. } => None,
        }
    }

    /// Whether this node is a container.
    #[must_use]
    pub fn is_container(&self) -> bool { matches!(self, Self::Container { .. }) }

    /// Whether this node is a container with `role`.
    #[must_use]
    pub fn has_role(&self, role: ContainerRole) -> bool { self.role() == Some(role) }

    /// Whether this node is a leaf of `owner` kind.
    #[must_use]
    pub fn is_leaf_of(&self, owner: &OwnerKind) -> bool { self.owner_kind() == Some(owner) }

    /// Pre-order, depth-first walk over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &PlanNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }

    /// Step slots of a scenario or example subtree in execution order.
    ///
    /// Composite containers are emitted as a slot and then walked into;
    /// example-row containers are walked into without being emitted. The
    /// node itself is never part of the result.
    #[must_use]
    pub fn step_slots(&self) -> Vec<&PlanNode> {
        let mut slots = Vec::new();
        collect_step_slots(self.children(), &mut slots);
        slots
    }

    fn fmt_outline(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Self::Container { label, children, .. } => {
                writeln!(f, "{indent}+ {label}")?;
                children
                    .iter()
                    .try_for_each(|child| child.fmt_outline(f, depth + 1))
            }
            Self::Leaf { label, owner } => writeln!(f, "{indent}- {label} [{owner}]"),
        }
    }
}

fn collect_step_slots<'p>(nodes: &'p [PlanNode], slots: &mut Vec<&'p PlanNode>) {
    for node in nodes {
        if !node.has_role(ContainerRole::Example) {
            slots.push(node);
        }
        collect_step_slots(node.children(), slots);
    }
}

impl fmt::Display for PlanNode {
    /// Indented outline: `+` marks containers, `-` marks leaves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.fmt_outline(f, 0) }
}

/// A built plan: the root container plus build statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    granularity: Granularity,
    root: PlanNode,
    step_count: usize,
}

impl Plan {
    pub(crate) fn new(granularity: Granularity, root: PlanNode, step_count: usize) -> Self {
        Self {
            granularity,
            root,
            step_count,
        }
    }

    /// Granularity the plan was built at.
    #[must_use]
    pub fn granularity(&self) -> Granularity { self.granularity }

    /// Root container.
    #[must_use]
    pub fn root(&self) -> &PlanNode { &self.root }

    /// Number of leaves standing for executable units.
    ///
    /// At step granularity this counts step leaves, including unknown steps;
    /// at story granularity it counts story leaves. Containers, bookends and
    /// given-story slots never count.
    #[must_use]
    pub fn step_count(&self) -> usize { self.step_count }

    /// All labels in pre-order.
    pub fn labels(&self) -> impl Iterator<Item = &str> { self.root.walk().map(PlanNode::label) }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.root, f) }
}
