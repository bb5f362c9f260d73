pub mod error;
pub mod ids;
pub mod identity;

pub use error::*;
pub use identity::*;
pub use ids::*;
