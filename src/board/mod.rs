mod deck;
mod table;

pub use deck::*;
pub use table::*;
