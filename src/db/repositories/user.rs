use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{roles, users};
use crate::models::avatar::Avatar;
use crate::models::user::User;

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
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
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_with_role(
        &self,
        filter: sea_orm::Select<users::Entity>,
    ) -> Result<Option<User>> {
        let row = filter
            .find_also_related(roles::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query user")?;

        match row {
            Some((user, Some(role))) => Ok(Some(User::from_models(user, role))),
            Some((user, None)) => anyhow::bail!("User {} has no role row", user.id),
            None => Ok(None),
        }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        self.find_with_role(users::Entity::find_by_id(id)).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_with_role(
            users::Entity::find().filter(users::Column::Username.eq(username)),
        )
        .await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .find_also_related(roles::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        rows.into_iter()
            .map(|(user, role)| {
                let role = role
                    .ok_or_else(|| anyhow::anyhow!("User {} has no role row", user.id))?;
                Ok(User::from_models(user, role))
            })
            .collect()
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to check username")?;
        Ok(existing.is_some())
    }

    pub async fn email_taken(&self, email: &str, exclude_user: Option<i32>) -> Result<bool> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(id) = exclude_user {
            query = query.filter(users::Column::Id.ne(id));
        }
        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to check email")?;
        Ok(existing.is_some())
    }

    /// Insert a new user with a hashed password. Uniqueness of username and
    /// email is checked by the caller first; the unique indexes back that up.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: Option<String>,
        role_id: i32,
        security: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            full_name: Set(full_name),
            avatar_type: Set("url".to_string()),
            role_id: Set(role_id),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        self.get_by_id(model.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User vanished after insert"))
    }

    /// Verify a password against the stored hash. Argon2 runs on a blocking
    /// thread so it does not stall the async runtime.
    pub async fn verify_password(&self, user_id: i32, password: &str) -> Result<bool> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn update_password(
        &self,
        user_id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let password = new_password.to_string();
        let security = security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();

        if let Some(full_name) = update.full_name {
            active.full_name = Set(Some(full_name));
        }
        if let Some(email) = update.email {
            active.email = Set(email);
        }
        if let Some(bio) = update.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(phone) = update.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = update.address {
            active.address = Set(Some(address));
        }
        if let Some(date_of_birth) = update.date_of_birth {
            active.date_of_birth = Set(Some(date_of_birth));
        }
        if let Some(gender) = update.gender {
            active.gender = Set(Some(gender));
        }
        if let Some(student_id) = update.student_id {
            active.student_id = Set(Some(student_id));
        }
        if let Some(faculty) = update.faculty {
            active.faculty = Set(Some(faculty));
        }
        if let Some(major) = update.major {
            active.major = Set(Some(major));
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Commit a new avatar state. All three columns change as a unit inside
    /// one transaction so a partial update is never observable.
    ///
    /// Returns the state being replaced, read inside the same transaction,
    /// so the caller can clean up the previous file without trusting a
    /// possibly stale snapshot of the user.
    pub async fn set_avatar(&self, user_id: i32, avatar: &Avatar) -> Result<Avatar> {
        let txn = self.conn.begin().await?;

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await
            .context("Failed to query user for avatar update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let previous = Avatar::from_columns(
            &user.avatar_type,
            user.avatar_url.clone(),
            user.avatar_filename.clone(),
        );

        let (avatar_type, avatar_url, avatar_filename) = avatar.to_columns();

        let mut active: users::ActiveModel = user.into();
        active.avatar_type = Set(avatar_type.to_string());
        active.avatar_url = Set(avatar_url);
        active.avatar_filename = Set(avatar_filename);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(previous)
    }

    /// Rebind the user's role by name. Returns `false` (user untouched)
    /// when no such role exists.
    pub async fn assign_role(&self, user_id: i32, role_name: &str) -> Result<bool> {
        let Some(role) = roles::Entity::find()
            .filter(roles::Column::Name.eq(role_name))
            .one(&self.conn)
            .await
            .context("Failed to look up role")?
        else {
            return Ok(false);
        };

        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for role change")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.role_id = Set(role.id);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn delete(&self, user_id: i32) -> Result<bool> {
        let result = users::Entity::delete_by_id(user_id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with configured params.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
