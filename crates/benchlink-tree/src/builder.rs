//! Builds a display tree from a flat cycle-structure response
//!
//! The server returns the structure as a declared root plus a flat node list
//! linked by parent keys, parents listed before their children. The builder
//! inserts nodes in response order, so sibling order on screen matches the
//! numbering order the server produced.
//!
//! Test cases are the innermost leaves and are not rendered, but their
//! presence still decides whether their parent is expandable.

use std::collections::HashMap;

use tracing::warn;

use benchlink_client::types::{CycleNode, CycleStructure, ElementType};

use crate::arena::{CollapseState, DisplayNode, NodeId, TreeArena};

/// Builds theme-view nodes for one cycle structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleTreeBuilder;

impl CycleTreeBuilder {
    /// Insert the structure into `arena`, hanging its root under `parent`.
    /// Returns the id of the inserted root node.
    pub fn build(
        arena: &mut TreeArena,
        structure: &CycleStructure,
        parent: Option<NodeId>,
    ) -> NodeId {
        let mut child_counts: HashMap<&str, usize> = HashMap::new();
        for node in &structure.nodes {
            let parent_key = node
                .base
                .parent_key
                .as_deref()
                .unwrap_or(&structure.root.base.key);
            *child_counts.entry(parent_key).or_insert(0) += 1;
        }

        let root_id = arena.insert(DisplayNode {
            key: structure.root.base.key.clone(),
            unique_id: structure.root.base.unique_id.clone(),
            label: structure.root.base.label(),
            element_type: structure.root.element_type,
            collapse: CollapseState::Expanded,
            parent,
            children: Vec::new(),
        });

        let mut ids: HashMap<&str, NodeId> = HashMap::new();
        ids.insert(structure.root.base.key.as_str(), root_id);

        for node in &structure.nodes {
            if node.element_type.is_leaf() {
                continue;
            }
            let parent_key = node
                .base
                .parent_key
                .as_deref()
                .unwrap_or(&structure.root.base.key);
            let parent_id = match ids.get(parent_key) {
                Some(id) => *id,
                None => {
                    warn!(
                        key = %node.base.key,
                        parent_key,
                        "structure node references unknown parent, attaching to root"
                    );
                    root_id
                }
            };
            let id = arena.insert(DisplayNode {
                key: node.base.key.clone(),
                unique_id: node.base.unique_id.clone(),
                label: node.base.label(),
                element_type: node.element_type,
                collapse: Self::collapse_for(node, &child_counts),
                parent: Some(parent_id),
                children: Vec::new(),
            });
            ids.insert(node.base.key.as_str(), id);
        }

        root_id
    }

    fn collapse_for(node: &CycleNode, child_counts: &HashMap<&str, usize>) -> CollapseState {
        if node.element_type == ElementType::TestCaseSet {
            return CollapseState::None;
        }
        if child_counts.get(node.base.key.as_str()).copied().unwrap_or(0) > 0 {
            CollapseState::Collapsed
        } else {
            CollapseState::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchlink_client::types::NodeBase;
    use proptest::prelude::*;

    fn cycle_node(
        element_type: ElementType,
        key: &str,
        parent_key: Option<&str>,
        numbering: &str,
        name: &str,
    ) -> CycleNode {
        CycleNode {
            element_type,
            base: NodeBase {
                key: key.to_string(),
                parent_key: parent_key.map(str::to_string),
                name: name.to_string(),
                numbering: Some(numbering.to_string()),
                unique_id: format!("uid-{key}"),
            },
        }
    }

    fn sample_structure() -> CycleStructure {
        CycleStructure {
            root: cycle_node(ElementType::TestTheme, "root", None, "1", "Cycle Root"),
            nodes: vec![
                cycle_node(ElementType::TestTheme, "t1", Some("root"), "1.1", "Auth"),
                cycle_node(ElementType::TestCaseSet, "s1", Some("t1"), "1.1.1", "Login"),
                cycle_node(ElementType::TestCase, "c1", Some("s1"), "1.1.1.1", "Valid login"),
                cycle_node(ElementType::TestCase, "c2", Some("s1"), "1.1.1.2", "Bad password"),
                cycle_node(ElementType::TestTheme, "t2", Some("root"), "1.2", "Search"),
            ],
        }
    }

    #[test]
    fn test_leaves_are_excluded() {
        let mut arena = TreeArena::new();
        CycleTreeBuilder::build(&mut arena, &sample_structure(), None);

        // root, t1, s1, t2; the two test cases are not rendered
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_sibling_order_matches_response() {
        let mut arena = TreeArena::new();
        let root = CycleTreeBuilder::build(&mut arena, &sample_structure(), None);

        let labels: Vec<String> = arena
            .get(root)
            .unwrap()
            .children
            .iter()
            .map(|&id| arena.get(id).unwrap().label.clone())
            .collect();
        assert_eq!(labels, vec!["1.1 Auth", "1.2 Search"]);
    }

    #[test]
    fn test_case_sets_are_not_expandable() {
        let mut arena = TreeArena::new();
        let root = CycleTreeBuilder::build(&mut arena, &sample_structure(), None);

        let theme = arena.get(root).unwrap().children[0];
        let set = arena.get(theme).unwrap().children[0];
        let set_node = arena.get(set).unwrap();
        assert_eq!(set_node.element_type, ElementType::TestCaseSet);
        assert_eq!(set_node.collapse, CollapseState::None);
        assert!(!set_node.is_expandable());
        assert!(set_node.children.is_empty());
    }

    #[test]
    fn test_empty_theme_is_not_expandable() {
        let mut arena = TreeArena::new();
        let root = CycleTreeBuilder::build(&mut arena, &sample_structure(), None);

        let empty_theme = arena.get(root).unwrap().children[1];
        assert_eq!(arena.get(empty_theme).unwrap().collapse, CollapseState::None);
    }

    #[test]
    fn test_orphan_attaches_to_root() {
        let mut structure = sample_structure();
        structure.nodes.push(cycle_node(
            ElementType::TestTheme,
            "stray",
            Some("missing"),
            "9.9",
            "Stray",
        ));
        let mut arena = TreeArena::new();
        let root = CycleTreeBuilder::build(&mut arena, &structure, None);

        let last = *arena.get(root).unwrap().children.last().unwrap();
        assert_eq!(arena.get(last).unwrap().key, "stray");
    }

    #[test]
    fn test_root_hangs_under_given_parent() {
        let mut arena = TreeArena::new();
        let cycle = arena.insert(DisplayNode {
            key: "cycle-1".to_string(),
            unique_id: String::new(),
            label: "Cycle 1".to_string(),
            element_type: ElementType::Cycle,
            collapse: CollapseState::Collapsed,
            parent: None,
            children: Vec::new(),
        });
        let root = CycleTreeBuilder::build(&mut arena, &sample_structure(), Some(cycle));

        assert_eq!(arena.get(root).unwrap().parent, Some(cycle));
        assert_eq!(arena.get(cycle).unwrap().children, vec![root]);
    }

    prop_compose! {
        fn arb_structure()(parents in prop::collection::vec(0usize..=20, 0..20)) -> CycleStructure {
            let root = cycle_node(ElementType::TestTheme, "root", None, "1", "Root");
            let mut nodes = Vec::new();
            for (i, parent) in parents.iter().enumerate() {
                let parent_key = if *parent == 0 || *parent > i {
                    "root".to_string()
                } else {
                    format!("n{}", parent - 1)
                };
                let element_type = match i % 3 {
                    0 => ElementType::TestTheme,
                    1 => ElementType::TestCaseSet,
                    _ => ElementType::TestCase,
                };
                nodes.push(cycle_node(
                    element_type,
                    &format!("n{i}"),
                    Some(&parent_key),
                    "1.1",
                    "Node",
                ));
            }
            CycleStructure { root, nodes }
        }
    }

    proptest! {
        #[test]
        fn test_build_preserves_input_order(structure in arb_structure()) {
            let mut arena = TreeArena::new();
            CycleTreeBuilder::build(&mut arena, &structure, None);

            // Arena insertion order equals the filtered response order.
            let expected: Vec<&str> = structure
                .nodes
                .iter()
                .filter(|n| !n.element_type.is_leaf())
                .map(|n| n.base.key.as_str())
                .collect();
            let mut actual = Vec::new();
            for index in 1..arena.len() {
                actual.push(arena.get(NodeId(index)).unwrap().key.clone());
            }
            prop_assert_eq!(actual, expected.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        }
    }
}
