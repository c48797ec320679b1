pub mod enums;
mod patient;
mod visit;

pub use patient::*;
pub use visit::*;
