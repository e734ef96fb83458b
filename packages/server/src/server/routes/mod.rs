// HTTP routes
pub mod analyze;
pub mod diagnostics;
pub mod health;

pub use analyze::*;
pub use diagnostics::*;
pub use health::*;
