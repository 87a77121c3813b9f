pub use super::categories::Entity as Categories;
pub use super::roles::Entity as Roles;
pub use super::ukms::Entity as Ukms;
pub use super::users::Entity as Users;
