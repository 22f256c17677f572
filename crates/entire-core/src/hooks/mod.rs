pub mod handlers;
pub mod install;
pub mod types;

pub use handlers::{handle_agent_event, handle_post_commit, handle_prepare_commit_msg};
pub use install::InstallError;
pub use types::{HookEvent, HookInput, HookOutput};
