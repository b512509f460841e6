use crate::graph::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("no start node was given for the layout")]
    MissingStartNode,
    #[error("{0} is not in this graph")]
    NodeNotFound(NodeId),
    #[error("cannot lay out an empty graph")]
    EmptyGraph,
    #[error("node mass must be positive and finite, got {0}")]
    InvalidMass(f64),
    #[error("invalid layout configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
