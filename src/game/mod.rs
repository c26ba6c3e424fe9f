mod dealer;
mod player;
mod seat;

pub use dealer::*;
pub use player::*;
pub use seat::*;
