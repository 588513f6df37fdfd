mod context;
mod statement;

pub use context::*;
pub use statement::*;
