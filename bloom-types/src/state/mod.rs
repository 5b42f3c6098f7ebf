pub mod music;
pub mod project;
pub mod sequence;

pub use music::*;
pub use project::*;
pub use sequence::*;
