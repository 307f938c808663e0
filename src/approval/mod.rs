// ABOUTME: Command governance — risk analysis, approval policy, and signed approval tokens.
// ABOUTME: Decides which terminal commands need a human's approval before they run.

pub mod analysis;
pub mod engine;
pub mod policy;
pub mod token;
pub mod types;

pub use analysis::*;
pub use engine::*;
pub use policy::*;
pub use token::*;
pub use types::*;
