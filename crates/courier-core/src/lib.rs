pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod messages;

pub use auth::{AuthService, NewUser};
pub use config::Config;
pub use directory::UserDirectory;
pub use error::CoreError;
pub use messages::MessageService;
