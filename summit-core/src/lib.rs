//! Domain model for summit: members, roadmaps and the goal rooms that run them.
//!
//! Nothing in here does I/O. Every rule is checked in memory and broken
//! rules are reported as [DomainError].

mod error;
mod goal_room;
mod member;
mod roadmap;
mod util;

pub use error::*;
pub use goal_room::*;
pub use member::*;
pub use roadmap::*;
pub use util::*;
