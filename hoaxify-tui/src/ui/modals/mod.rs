// Modal rendering modules
mod utils;
mod composer;
mod delete;
mod help;

// Re-export all public functions
pub use utils::centered_rect;
pub use composer::*;
pub use delete::*;
pub use help::*;
