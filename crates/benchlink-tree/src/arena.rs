//! Flat node arena backing both tree views
//!
//! Nodes are stored in one `Vec` and addressed by [`NodeId`] indices, so
//! parent and child links are plain copyable handles. Ids stay valid until
//! the arena is cleared or truncated; nodes are never removed individually,
//! only as a trailing range.

use benchlink_client::types::ElementType;

use crate::error::TreeError;

/// Handle to a node in a [`TreeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Initial expansion state of a node when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseState {
    /// Expandable, shown collapsed.
    Collapsed,
    /// Expandable, shown expanded.
    Expanded,
    /// Not expandable.
    None,
}

/// One renderable node of either view.
#[derive(Debug, Clone)]
pub struct DisplayNode {
    /// Server-side key, used for ancestor lookups and request building.
    pub key: String,
    /// Stable unique id used to scope report generation to a subtree.
    /// Empty for project-view nodes, which have no such id.
    pub unique_id: String,
    /// Rendered label, numbering prefix included.
    pub label: String,
    pub element_type: ElementType,
    pub collapse: CollapseState,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl DisplayNode {
    #[must_use]
    pub fn is_expandable(&self) -> bool {
        self.collapse != CollapseState::None
    }
}

/// Arena of display nodes shared by the project and theme views.
#[derive(Debug, Default)]
pub struct TreeArena {
    nodes: Vec<DisplayNode>,
}

impl TreeArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Drop every node at index `len` and above, and unlink them from the
    /// child lists of the surviving nodes. Ids of dropped nodes become
    /// invalid. Parents are always inserted before their children, so no
    /// surviving node can point upward at a dropped one.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.nodes.len() {
            return;
        }
        self.nodes.truncate(len);
        for node in &mut self.nodes {
            node.children.retain(|child| child.0 < len);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node and link it under its parent, keeping the parent's
    /// child list in insertion order.
    pub fn insert(&mut self, mut node: DisplayNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(parent.0) {
                parent_node.children.push(id);
            } else {
                node.parent = None;
            }
        }
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Result<&DisplayNode, TreeError> {
        self.nodes
            .get(id.0)
            .ok_or(TreeError::InvalidNode { index: id.0 })
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut DisplayNode, TreeError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(TreeError::InvalidNode { index: id.0 })
    }

    /// Record a user expand/collapse action so the state survives reloads of
    /// the other view.
    pub fn set_collapse(&mut self, id: NodeId, state: CollapseState) -> Result<(), TreeError> {
        self.get_mut(id)?.collapse = state;
        Ok(())
    }

    /// Walk parent links from `id` upward (inclusive) until a node of the
    /// wanted element type is found.
    pub fn ancestor_of_type(
        &self,
        id: NodeId,
        wanted: ElementType,
    ) -> Result<&DisplayNode, TreeError> {
        let mut current = Some(id);
        while let Some(cursor) = current {
            let node = self.get(cursor)?;
            if node.element_type == wanted {
                return Ok(node);
            }
            current = node.parent;
        }
        let key = self.get(id)?.key.clone();
        Err(TreeError::AncestorNotFound {
            wanted: match wanted {
                ElementType::Project => "project",
                ElementType::Version => "version",
                ElementType::Cycle => "cycle",
                ElementType::TestTheme => "test theme",
                ElementType::TestCaseSet => "test case set",
                ElementType::TestCase => "test case",
            },
            key,
        })
    }
}
