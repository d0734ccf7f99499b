use chrono::Utc;
use uuid::Uuid;

use super::Storage;
use super::models::{Profile, Role};
use super::params::NewProfile;
use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::LawdeskError;

const PROFILE_COLUMNS: &str = "id, email, role, full_name, phone, address, license_number, \
                               specialization, password_hash, created_at";

impl Storage {
    pub async fn find_profile(&self, id: &str) -> Result<Option<Profile>, LawdeskError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?");
        Ok(sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, LawdeskError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = ? COLLATE NOCASE");
        Ok(sqlx::query_as::<_, Profile>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool())
            .await?)
    }

    /// Validate, hash the password, and insert a new profile with `role`.
    pub async fn create_profile(&self, new: NewProfile, role: Role) -> Result<Profile, LawdeskError> {
        let email = new.email.trim().to_lowercase();
        if email.is_empty() || new.password.is_empty() {
            return Err(LawdeskError::validation(
                "البريد الإلكتروني وكلمة المرور مطلوبان",
            ));
        }
        if !email.contains('@') {
            return Err(LawdeskError::validation("البريد الإلكتروني غير صالح"));
        }
        validate_password_strength(&new.password)?;
        if self.find_profile_by_email(&email).await?.is_some() {
            return Err(LawdeskError::EmailTaken);
        }

        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            email,
            role,
            full_name: new.full_name,
            phone: new.phone,
            address: new.address,
            license_number: new.license_number,
            specialization: new.specialization,
            password_hash: hash_password(&new.password)?,
            created_at: Utc::now(),
        };

        let res = sqlx::query(
            r#"INSERT INTO profiles (
                   id, email, role, full_name, phone, address,
                   license_number, specialization, password_hash, created_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(profile.role)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.license_number)
        .bind(&profile.specialization)
        .bind(&profile.password_hash)
        .bind(profile.created_at)
        .execute(self.pool())
        .await;

        match res {
            Ok(_) => Ok(profile),
            // lost a race with another registration of the same email
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(LawdeskError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, LawdeskError> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = ? ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Profile>(&sql)
            .bind(role)
            .fetch_all(self.pool())
            .await?)
    }

    /// Delete a lawyer and, through cascades, everything they own.
    pub async fn delete_lawyer(&self, id: &str) -> Result<(), LawdeskError> {
        let profile = self
            .find_profile(id)
            .await?
            .ok_or(LawdeskError::NotFound("lawyer"))?;
        if profile.role != Role::Lawyer {
            return Err(LawdeskError::Forbidden);
        }
        sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

