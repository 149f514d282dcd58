pub use self::{entity::*, grid_map::*, level::*, pos::*};

pub(crate) mod entity;
pub(crate) mod grid_map;
pub(crate) mod level;
pub(crate) mod pos;
