mod summary;
mod types;
mod validate;

pub use summary::*;
pub use types::*;
pub use validate::*;
