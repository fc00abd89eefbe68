pub use block::*;
pub use neighborhood::*;

mod block;
mod neighborhood;
