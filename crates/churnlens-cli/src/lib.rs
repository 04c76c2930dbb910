pub mod predict;
pub mod score;
pub mod util;
