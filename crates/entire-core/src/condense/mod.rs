pub mod condenser;
pub mod errors;
pub mod metadata;

pub use condenser::{finalize, prepare, FinalizeOutcome, PrepareOutcome};
pub use errors::CondenseError;
pub use metadata::CheckpointInfo;
