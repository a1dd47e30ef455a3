mod plane;
mod tile;

pub use plane::*;
pub use tile::*;
