mod aggregate;
mod page;
mod q;
pub(crate) mod queryset;

pub use aggregate::*;
pub use page::*;
pub use q::*;
pub use queryset::*;
