pub mod dependency;
pub mod enums;
pub mod filter;
pub mod ids;
pub mod task;

pub use dependency::*;
pub use enums::*;
pub use filter::*;
pub use ids::*;
pub use task::*;
