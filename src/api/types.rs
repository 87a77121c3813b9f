use serde::{Deserialize, Serialize};

use crate::db::RoleWithCount;
use crate::entities::categories;
use crate::models::ukm::Ukm;
use crate::models::user::User;

/// Body of every non-2xx response, and of simple success acknowledgements.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Users / roles
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RoleSummaryDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub user_count: u64,
}

impl From<RoleWithCount> for RoleDto {
    fn from(role: RoleWithCount) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            created_at: role.created_at,
            user_count: role.user_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: RoleSummaryDto,
    pub role_id: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<&'static str>>,
}

impl UserDto {
    #[must_use]
    pub fn from_user(user: &User, include_permissions: bool) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: RoleSummaryDto {
                id: user.role.id,
                name: user.role.name.clone(),
                description: user.role.description.clone(),
            },
            role_id: user.role.id,
            is_active: user.is_active,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
            permissions: include_permissions
                .then(|| user.permissions().iter().map(|p| p.as_str()).collect()),
        }
    }
}

/// Full profile including avatar state. `avatar_url` carries the resolved
/// display URL regardless of how the avatar is stored.
#[derive(Debug, Serialize)]
pub struct ProfileDto {
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
    pub avatar_url: Option<String>,
    pub avatar_filename: Option<String>,
    pub avatar_type: String,
    pub role: RoleSummaryDto,
    pub role_id: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ProfileDto {
    #[must_use]
    pub fn from_user(user: &User, request_host: Option<&str>) -> Self {
        let (avatar_type, _, avatar_filename) = user.avatar.to_columns();
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            bio: user.bio.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            date_of_birth: user.date_of_birth.clone(),
            gender: user.gender.clone(),
            student_id: user.student_id.clone(),
            faculty: user.faculty.clone(),
            major: user.major.clone(),
            avatar_url: user.avatar.display_url(request_host),
            avatar_filename,
            avatar_type: avatar_type.to_string(),
            role: RoleSummaryDto {
                id: user.role.id,
                name: user.role.name.clone(),
                description: user.role.description.clone(),
            },
            role_id: user.role.id,
            is_active: user.is_active,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    /// Role name; defaults to the regular user role.
    pub role_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    pub role_name: String,
}

/// Basic profile update accepted on the auth namespace.
#[derive(Debug, Deserialize)]
pub struct AccountUpdateRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Partial profile update; absent fields stay untouched.
#[derive(Debug, Deserialize, Default)]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub student_id: Option<String>,
    pub faculty: Option<String>,
    pub major: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordUpdateRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarUpdateRequest {
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarUploadResponse {
    pub message: String,
    pub filename: String,
    pub avatar_url: Option<String>,
}

// ============================================================================
// Categories / UKMs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
}

impl From<categories::Model> for CategoryDto {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            icon: model.icon,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CategoryUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// UKM as exposed to the frontend. Field names are the original Indonesian
/// ones; `name` mirrors `nama` for frontend compatibility.
#[derive(Debug, Serialize)]
pub struct UkmDto {
    pub id: i32,
    pub nama: String,
    pub name: String,
    pub deskripsi: Option<String>,
    pub category_id: i32,
    pub category: CategoryDto,
    pub logo_url: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub prestasi: Option<String>,
    pub kegiatan_rutin: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Ukm> for UkmDto {
    fn from(ukm: Ukm) -> Self {
        Self {
            id: ukm.id,
            name: ukm.nama.clone(),
            nama: ukm.nama,
            deskripsi: ukm.deskripsi,
            category_id: ukm.category.id,
            category: CategoryDto {
                id: ukm.category.id,
                name: ukm.category.name,
                description: ukm.category.description,
                icon: ukm.category.icon,
                created_at: ukm.category.created_at,
            },
            logo_url: ukm.logo_url,
            contact_person: ukm.contact_person,
            contact_email: ukm.contact_email,
            contact_phone: ukm.contact_phone,
            prestasi: ukm.prestasi,
            kegiatan_rutin: ukm.kegiatan_rutin,
            is_active: ukm.is_active,
            created_at: ukm.created_at,
            updated_at: ukm.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UkmCreateRequest {
    pub nama: String,
    pub deskripsi: Option<String>,
    pub category_id: i32,
    pub logo_url: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub prestasi: Option<String>,
    pub kegiatan_rutin: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UkmUpdateRequest {
    pub nama: Option<String>,
    pub deskripsi: Option<String>,
    pub category_id: Option<i32>,
    pub logo_url: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub prestasi: Option<String>,
    pub kegiatan_rutin: Option<String>,
}
