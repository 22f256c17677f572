pub mod errors;
pub mod points;
pub mod reset;
pub mod restore;

pub use errors::RewindError;
pub use points::{list_rewind_points, RewindPoint};
pub use reset::{clean, reset, reset_session, CleanReport, ResetReport};
pub use restore::{rewind, RewindReport};
