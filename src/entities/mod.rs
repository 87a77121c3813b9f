pub mod prelude;

pub mod categories;
pub mod roles;
pub mod ukms;
pub mod users;
