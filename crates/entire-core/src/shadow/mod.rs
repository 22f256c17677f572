pub mod engine;
pub mod errors;
pub mod overlap;
pub mod snapshot;

pub use engine::{
    append_checkpoint, initialize_session, session_start_warning, AppendOutcome, ConflictInfo,
    InitOutcome, InitRequest,
};
pub use errors::ShadowError;
