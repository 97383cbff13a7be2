mod arg;
mod column;
mod func;
mod functions;
mod operators;

pub use arg::*;
pub use column::*;
pub use func::*;
pub use operators::*;
