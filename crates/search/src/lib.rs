mod error;
mod session;

pub use error::{Result, SearchError};
pub use session::{SearchHit, SearchSession};
