// 👤 Admin Profile - the single administrator account
//
// One row (id = 1) holding display name, email and a salted SHA-256 password
// hash. Seeded on first start from configuration.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::activity_log::{self, LogAction, NewLogEntry};
use crate::entities::{clean, clean_opt, is_valid_email};
use crate::error::{FieldError, RecordsError, Result};

pub const DEFAULT_ADMIN_NAME: &str = "Admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@school.edu";
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminProfile {
    pub name: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}{}", salt, password));
    format!("{:x}", hasher.finalize())
}

/// Create the profile row if it is missing; an existing row is left alone
pub fn ensure_admin(conn: &Connection, default_password: &str) -> Result<AdminProfile> {
    if let Some(profile) = find_profile(conn)? {
        return Ok(profile);
    }

    let salt = uuid::Uuid::new_v4().simple().to_string();
    let now = Utc::now();
    conn.execute(
        "INSERT INTO admin_profile (id, name, email, password_hash, salt, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5)",
        params![
            DEFAULT_ADMIN_NAME,
            DEFAULT_ADMIN_EMAIL,
            hash_password(&salt, default_password),
            salt,
            now.to_rfc3339(),
        ],
    )?;
    tracing::info!(email = DEFAULT_ADMIN_EMAIL, "seeded admin profile");

    Ok(AdminProfile {
        name: DEFAULT_ADMIN_NAME.to_string(),
        email: DEFAULT_ADMIN_EMAIL.to_string(),
        updated_at: now,
    })
}

fn find_profile(conn: &Connection) -> Result<Option<AdminProfile>> {
    let row = conn
        .query_row(
            "SELECT name, email, updated_at FROM admin_profile WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    crate::entities::timestamp(row, 2)?,
                ))
            },
        )
        .optional()?;

    Ok(row.map(|(name, email, updated_at)| AdminProfile {
        name,
        email,
        updated_at,
    }))
}

pub fn get_profile(conn: &Connection) -> Result<AdminProfile> {
    find_profile(conn)?.ok_or(RecordsError::StorageUnavailable)
}

pub fn update_profile(conn: &Connection, patch: ProfilePatch) -> Result<AdminProfile> {
    let current = get_profile(conn)?;

    let name = patch.name.map(clean).unwrap_or(current.name);
    let email = clean_opt(patch.email)
        .map(|e| e.to_lowercase())
        .unwrap_or(current.email);

    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push(FieldError::new("name", "is required"));
    }
    if !is_valid_email(&email) {
        errors.push(FieldError::new("email", "is not a valid email address"));
    }
    if !errors.is_empty() {
        return Err(RecordsError::from_field_errors(errors));
    }

    let now = Utc::now();
    conn.execute(
        "UPDATE admin_profile SET name = ?1, email = ?2, updated_at = ?3 WHERE id = 1",
        params![name, email, now.to_rfc3339()],
    )?;

    activity_log::record_best_effort(
        conn,
        &NewLogEntry::new(LogAction::Updated, "Admin", format!("Updated admin profile: {}", name)),
    );

    Ok(AdminProfile {
        name,
        email,
        updated_at: now,
    })
}

pub fn change_password(conn: &Connection, change: &PasswordChange) -> Result<()> {
    let (stored_hash, salt): (String, String) = conn
        .query_row(
            "SELECT password_hash, salt FROM admin_profile WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(RecordsError::StorageUnavailable)?;

    if hash_password(&salt, &change.current_password) != stored_hash {
        return Err(RecordsError::AuthFailed(
            "current password is incorrect".to_string(),
        ));
    }
    if change.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RecordsError::invalid(
            "new_password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }

    let new_salt = uuid::Uuid::new_v4().simple().to_string();
    conn.execute(
        "UPDATE admin_profile SET password_hash = ?1, salt = ?2, updated_at = ?3 WHERE id = 1",
        params![
            hash_password(&new_salt, &change.new_password),
            new_salt,
            Utc::now().to_rfc3339(),
        ],
    )?;

    activity_log::record_best_effort(
        conn,
        &NewLogEntry::new(LogAction::Updated, "Admin", "Changed admin password"),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_log::list_recent;
    use crate::db::setup_database;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        ensure_admin(&conn, "admin123").unwrap();
        conn
    }

    fn change(current: &str, new: &str) -> PasswordChange {
        PasswordChange {
            current_password: current.to_string(),
            new_password: new.to_string(),
        }
    }

    #[test]
    fn test_ensure_admin_is_idempotent() {
        let conn = conn();
        update_profile(
            &conn,
            ProfilePatch {
                name: Some("Registrar".to_string()),
                email: None,
            },
        )
        .unwrap();

        let again = ensure_admin(&conn, "other-password").unwrap();
        assert_eq!(again.name, "Registrar");
        change_password(&conn, &change("admin123", "new-secret-1")).unwrap();
    }

    #[test]
    fn test_update_profile_logs_and_validates() {
        let conn = conn();
        let updated = update_profile(
            &conn,
            ProfilePatch {
                name: None,
                email: Some("  Principal@School.edu ".to_string()),
            },
        )
        .unwrap();
        assert_eq!(updated.email, "principal@school.edu");
        assert_eq!(get_profile(&conn).unwrap().email, "principal@school.edu");

        let entry = &list_recent(&conn, 1).unwrap()[0];
        assert_eq!(entry.action, LogAction::Updated);
        assert_eq!(entry.entity_type, "Admin");

        let err = update_profile(
            &conn,
            ProfilePatch {
                name: None,
                email: Some("nope".to_string()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, RecordsError::Validation(_)));
    }

    #[test]
    fn test_change_password() {
        let conn = conn();

        let wrong = change_password(&conn, &change("guess", "new-secret-1")).unwrap_err();
        assert!(matches!(wrong, RecordsError::AuthFailed(_)));

        let short = change_password(&conn, &change("admin123", "short")).unwrap_err();
        assert!(matches!(short, RecordsError::Validation(_)));

        change_password(&conn, &change("admin123", "new-secret-1")).unwrap();
        assert!(change_password(&conn, &change("admin123", "another-one")).is_err());
        change_password(&conn, &change("new-secret-1", "another-one")).unwrap();
    }

    #[test]
    fn test_hash_depends_on_salt() {
        assert_ne!(hash_password("a", "pw"), hash_password("b", "pw"));
        assert_eq!(hash_password("a", "pw").len(), 64);
    }
}
