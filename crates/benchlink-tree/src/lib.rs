//! Display-tree model for projects and test cycle structures
//!
//! Two linked views share one node arena: the project view (projects,
//! versions, test cycles) and the theme view (the test structure of one
//! selected cycle). Selecting a cycle offloads its structure into the theme
//! view; the cycle node itself stays childless in the project view so the
//! structure is never rendered twice.

mod arena;
mod builder;
mod coordinator;
mod error;

pub use arena::{CollapseState, DisplayNode, NodeId, TreeArena};
pub use builder::CycleTreeBuilder;
pub use coordinator::TreeViewCoordinator;
pub use error::TreeError;
