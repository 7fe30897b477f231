pub mod constraints;
pub mod extract;
pub mod model;
pub mod program;
pub mod strategies;
pub mod types;

pub use constraints::*;
pub use extract::*;
pub use model::*;
pub use program::*;
pub use strategies::*;
pub use types::*;
