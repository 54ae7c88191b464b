mod key;
pub mod time;
pub mod validation;

pub use key::*;
