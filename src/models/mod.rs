pub mod avatar;
pub mod permission;
pub mod ukm;
pub mod user;
