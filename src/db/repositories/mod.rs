pub mod category;
pub mod role;
pub mod ukm;
pub mod user;
