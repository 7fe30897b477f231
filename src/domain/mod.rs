pub mod network;
pub mod solution;

pub use network::*;
pub use solution::*;
