mod csv;
mod paths;
mod session_store;

pub use csv::*;
pub use paths::*;
pub use session_store::*;
