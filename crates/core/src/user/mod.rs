//! Users, authentication and profile actions

pub mod actions;
pub mod checker;
pub mod ports;
pub mod service;

pub use actions::{user_view_actions, USER_VIEWS};
pub use checker::UserChecker;
pub use ports::UserRepository;
pub use service::{hash_api_token, UserService};
