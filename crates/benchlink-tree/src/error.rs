//! Tree model errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("node index {index} is not in the tree")]
    InvalidNode { index: usize },

    #[error("node {key} is not a test cycle")]
    NotACycle { key: String },

    #[error("no {wanted} ancestor above node {key}")]
    AncestorNotFound { wanted: &'static str, key: String },
}
