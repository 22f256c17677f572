pub mod errors;
pub mod loading;
pub mod types;

pub use errors::ConfigError;
pub use loading::{load_hierarchy, repo_config_path, user_config_path};
pub use types::{EntireConfig, Strategy};
