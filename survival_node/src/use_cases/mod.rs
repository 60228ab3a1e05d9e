// Session workflows and the node actor loop.

mod encounter;
mod lifecycle;
pub mod narration;
pub mod node;
pub mod replication;
pub mod session;
pub mod types;
mod world;

#[cfg(test)]
mod test_support;

pub use node::{NodeDeps, NodeInputs, NodeTimings, node_task};
pub use replication::Delivery;
pub use session::{Session, SessionSettings};
pub use types::{
    ActionReport, ActionResult, Item, NodeCommand, PositionUpdate, SessionView,
};
