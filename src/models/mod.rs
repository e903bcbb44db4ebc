pub mod diagram;
pub mod user;

pub use diagram::{Diagram, Edge, GraphChange, Node, NodeShape, Position};
pub use user::{Role, User};
