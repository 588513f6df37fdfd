mod node;
mod op;

pub use node::*;
pub use op::*;
