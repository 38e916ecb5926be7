pub mod colors;
pub mod crime;
pub mod geometry;
pub mod neighborhood;

pub use colors::category_color;
pub use crime::*;
pub use geometry::*;
pub use neighborhood::*;
