pub use self::{direction::*, grid::*, position::*};

pub(crate) mod direction;
pub(crate) mod grid;
pub(crate) mod position;
