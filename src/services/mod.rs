pub mod avatar;
pub use avatar::{AvatarError, AvatarService};

pub mod token;
pub use token::TokenService;
