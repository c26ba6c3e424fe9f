mod rules;
mod screen;

pub use rules::*;
pub use screen::*;
