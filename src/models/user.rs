use crate::entities::{roles, users};
use crate::models::avatar::Avatar;
use crate::models::permission::{self, Permission};

/// A user joined with its role. The password hash never leaves the
/// repository layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub student_id: Option<String>,
    pub faculty: Option<String>,
    pub major: Option<String>,
    pub avatar: Avatar,
    pub role: RoleInfo,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct RoleInfo {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl User {
    #[must_use]
    pub fn from_models(model: users::Model, role: roles::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            bio: model.bio,
            phone: model.phone,
            address: model.address,
            date_of_birth: model.date_of_birth,
            gender: model.gender,
            student_id: model.student_id,
            faculty: model.faculty,
            major: model.major,
            avatar: Avatar::from_columns(
                &model.avatar_type,
                model.avatar_url,
                model.avatar_filename,
            ),
            role: RoleInfo {
                id: role.id,
                name: role.name,
                description: role.description,
            },
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    /// Derived permission set; never cached on the record.
    #[must_use]
    pub fn permissions(&self) -> &'static [Permission] {
        permission::permissions_for_role(&self.role.name)
    }

    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.name == permission::ROLE_ADMIN
    }
}
