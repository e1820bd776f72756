//! Coordinates the project view and the theme view over one arena

use tracing::debug;

use benchlink_client::types::{CycleStructure, ElementType, ProjectNode};

use crate::arena::{CollapseState, DisplayNode, NodeId, TreeArena};
use crate::builder::CycleTreeBuilder;
use crate::error::TreeError;

/// Owns the shared arena plus the state of both views.
///
/// The project view lists projects, versions and cycles; selecting a cycle
/// offloads its test structure into the theme view. At most one cycle is
/// offloaded at a time, and the project view never shows theme nodes: a
/// cycle's children are reported as empty there.
#[derive(Debug, Default)]
pub struct TreeViewCoordinator {
    arena: TreeArena,
    project_roots: Vec<NodeId>,
    theme_root: Option<NodeId>,
    root_override: Option<NodeId>,
}

impl TreeViewCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    /// Load the project view from the nested trees of all visible projects.
    /// Resets everything, including any offloaded cycle and root override.
    pub fn load_projects(&mut self, projects: &[ProjectNode]) {
        self.arena.clear();
        self.project_roots.clear();
        self.theme_root = None;
        self.root_override = None;

        for project in projects {
            let id = self.insert_project_node(project, None);
            self.project_roots.push(id);
        }
        debug!(projects = projects.len(), nodes = self.arena.len(), "project view loaded");
    }

    fn insert_project_node(&mut self, node: &ProjectNode, parent: Option<NodeId>) -> NodeId {
        let children = node.children.as_deref().unwrap_or(&[]);
        let collapse = if children.is_empty() {
            CollapseState::None
        } else {
            CollapseState::Collapsed
        };
        let id = self.arena.insert(DisplayNode {
            key: node.key.clone(),
            unique_id: String::new(),
            label: node.name.clone(),
            element_type: node.node_type,
            collapse,
            parent,
            children: Vec::new(),
        });
        for child in children {
            self.insert_project_node(child, Some(id));
        }
        id
    }

    /// Top-level nodes of the project view, honoring a root override.
    pub fn project_roots(&self) -> Result<Vec<NodeId>, TreeError> {
        match self.root_override {
            Some(id) => {
                self.arena.get(id)?;
                Ok(vec![id])
            }
            None => Ok(self.project_roots.clone()),
        }
    }

    /// Children of a node as the project view renders them. Cycles are
    /// always childless here; their contents belong to the theme view.
    pub fn project_children(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let node = self.arena.get(id)?;
        if node.element_type == ElementType::Cycle {
            return Ok(Vec::new());
        }
        Ok(node.children.clone())
    }

    /// Restrict the project view to the subtree under `id`.
    pub fn focus_subtree(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.arena.get(id)?;
        self.root_override = Some(id);
        Ok(())
    }

    /// Drop the subtree focus set by [`Self::focus_subtree`].
    pub fn unfocus(&mut self) {
        self.root_override = None;
    }

    /// Offload a cycle's structure into the theme view.
    ///
    /// Replaces whatever cycle was offloaded before: the previous structure
    /// is dropped from the arena, its node ids become invalid. The new
    /// structure hangs under the cycle node in the arena so ancestor walks
    /// from theme nodes reach the cycle and its project.
    pub fn offload_cycle(
        &mut self,
        cycle: NodeId,
        structure: &CycleStructure,
    ) -> Result<NodeId, TreeError> {
        let node = self.arena.get(cycle)?;
        if node.element_type != ElementType::Cycle {
            return Err(TreeError::NotACycle {
                key: node.key.clone(),
            });
        }
        // Theme nodes always occupy the arena tail, starting at the
        // previous structure root.
        if let Some(previous) = self.theme_root.take() {
            self.arena.truncate(previous.0);
        }
        let root = CycleTreeBuilder::build(&mut self.arena, structure, Some(cycle));
        self.theme_root = Some(root);
        debug!(cycle = %self.arena.get(cycle)?.key, "cycle offloaded to theme view");
        Ok(root)
    }

    /// Top-level nodes of the theme view: the themes directly under the
    /// offloaded structure root. Empty when no cycle is offloaded.
    pub fn theme_roots(&self) -> Result<Vec<NodeId>, TreeError> {
        match self.theme_root {
            Some(root) => Ok(self.arena.get(root)?.children.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// Children of a node as the theme view renders them.
    pub fn theme_children(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        Ok(self.arena.get(id)?.children.clone())
    }

    /// Reset both views and the shared arena. Outstanding [`NodeId`]s become
    /// invalid.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.project_roots.clear();
        self.theme_root = None;
        self.root_override = None;
    }

    pub fn set_collapse(&mut self, id: NodeId, state: CollapseState) -> Result<(), TreeError> {
        self.arena.set_collapse(id, state)
    }

    /// Key of the project this node belongs to.
    pub fn project_key_of(&self, id: NodeId) -> Result<String, TreeError> {
        Ok(self
            .arena
            .ancestor_of_type(id, ElementType::Project)?
            .key
            .clone())
    }

    /// Key of the cycle this node belongs to.
    pub fn cycle_key_of(&self, id: NodeId) -> Result<String, TreeError> {
        Ok(self
            .arena
            .ancestor_of_type(id, ElementType::Cycle)?
            .key
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchlink_client::types::{CycleNode, NodeBase};

    fn project_tree() -> Vec<ProjectNode> {
        vec![ProjectNode {
            node_type: ElementType::Project,
            key: "p1".to_string(),
            name: "Webshop".to_string(),
            status: None,
            children: Some(vec![ProjectNode {
                node_type: ElementType::Version,
                key: "v1".to_string(),
                name: "2.0".to_string(),
                status: None,
                children: Some(vec![ProjectNode {
                    node_type: ElementType::Cycle,
                    key: "c1".to_string(),
                    name: "Sprint 12".to_string(),
                    status: Some("active".to_string()),
                    children: Some(vec![ProjectNode {
                        node_type: ElementType::TestTheme,
                        key: "embedded".to_string(),
                        name: "Should not render".to_string(),
                        status: None,
                        children: None,
                    }]),
                }]),
            }]),
        }]
    }

    fn structure() -> CycleStructure {
        let base = |key: &str, parent: Option<&str>, name: &str| NodeBase {
            key: key.to_string(),
            parent_key: parent.map(str::to_string),
            name: name.to_string(),
            numbering: None,
            unique_id: format!("uid-{key}"),
        };
        CycleStructure {
            root: CycleNode {
                element_type: ElementType::TestTheme,
                base: base("root", None, "Root"),
            },
            nodes: vec![
                CycleNode {
                    element_type: ElementType::TestTheme,
                    base: base("t1", Some("root"), "Auth"),
                },
                CycleNode {
                    element_type: ElementType::TestCaseSet,
                    base: base("s1", Some("t1"), "Login"),
                },
            ],
        }
    }

    fn find_cycle(coordinator: &TreeViewCoordinator) -> NodeId {
        let project = coordinator.project_roots().unwrap()[0];
        let version = coordinator.project_children(project).unwrap()[0];
        coordinator.project_children(version).unwrap()[0]
    }

    #[test]
    fn test_cycle_children_are_empty_in_project_view() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());

        let cycle = find_cycle(&coordinator);
        assert_eq!(
            coordinator.arena().get(cycle).unwrap().element_type,
            ElementType::Cycle
        );
        assert!(coordinator.project_children(cycle).unwrap().is_empty());
    }

    #[test]
    fn test_offload_populates_theme_view() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let cycle = find_cycle(&coordinator);

        coordinator.offload_cycle(cycle, &structure()).unwrap();
        let roots = coordinator.theme_roots().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(coordinator.arena().get(roots[0]).unwrap().label, "Auth");
    }

    #[test]
    fn test_offload_rejects_non_cycle() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let project = coordinator.project_roots().unwrap()[0];

        let err = coordinator.offload_cycle(project, &structure()).unwrap_err();
        assert!(matches!(err, TreeError::NotACycle { .. }));
    }

    #[test]
    fn test_ancestor_keys_from_theme_node() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let cycle = find_cycle(&coordinator);
        coordinator.offload_cycle(cycle, &structure()).unwrap();

        let theme = coordinator.theme_roots().unwrap()[0];
        let set = coordinator.theme_children(theme).unwrap()[0];
        assert_eq!(coordinator.cycle_key_of(set).unwrap(), "c1");
        assert_eq!(coordinator.project_key_of(set).unwrap(), "p1");
    }

    #[test]
    fn test_focus_subtree_overrides_roots() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let project = coordinator.project_roots().unwrap()[0];
        let version = coordinator.project_children(project).unwrap()[0];

        coordinator.focus_subtree(version).unwrap();
        assert_eq!(coordinator.project_roots().unwrap(), vec![version]);

        coordinator.unfocus();
        assert_eq!(coordinator.project_roots().unwrap(), vec![project]);
    }

    #[test]
    fn test_repeated_offload_replaces_previous_structure() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let cycle = find_cycle(&coordinator);

        coordinator.offload_cycle(cycle, &structure()).unwrap();
        let size_after_first = coordinator.arena().len();

        for _ in 0..10 {
            coordinator.offload_cycle(cycle, &structure()).unwrap();
        }
        assert_eq!(coordinator.arena().len(), size_after_first);
        assert_eq!(
            coordinator.arena().get(cycle).unwrap().children.len(),
            // the embedded project-view child plus the one offloaded root
            2
        );
        assert_eq!(coordinator.theme_roots().unwrap().len(), 1);
        assert_eq!(
            coordinator
                .arena()
                .get(coordinator.theme_roots().unwrap()[0])
                .unwrap()
                .label,
            "Auth"
        );
    }

    #[test]
    fn test_theme_view_empty_without_offload() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        assert!(coordinator.theme_roots().unwrap().is_empty());
    }

    #[test]
    fn test_collapse_state_survives_offload() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let project = coordinator.project_roots().unwrap()[0];
        coordinator
            .set_collapse(project, CollapseState::Expanded)
            .unwrap();

        let cycle = find_cycle(&coordinator);
        coordinator.offload_cycle(cycle, &structure()).unwrap();
        assert_eq!(
            coordinator.arena().get(project).unwrap().collapse,
            CollapseState::Expanded
        );
    }

    #[test]
    fn test_clear_resets_both_views() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let cycle = find_cycle(&coordinator);
        coordinator.offload_cycle(cycle, &structure()).unwrap();

        coordinator.clear();
        assert!(coordinator.project_roots().unwrap().is_empty());
        assert!(coordinator.theme_roots().unwrap().is_empty());
        assert!(coordinator.arena().is_empty());
    }

    #[test]
    fn test_reload_resets_offload() {
        let mut coordinator = TreeViewCoordinator::new();
        coordinator.load_projects(&project_tree());
        let cycle = find_cycle(&coordinator);
        coordinator.offload_cycle(cycle, &structure()).unwrap();

        coordinator.load_projects(&project_tree());
        assert!(coordinator.theme_roots().unwrap().is_empty());
    }
}
