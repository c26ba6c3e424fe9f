mod claims;
mod fairlock;

pub use claims::*;
pub use fairlock::*;
