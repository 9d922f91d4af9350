use crate::error::{Result, StoreError};
use dialdesk_core::domain::{normalize_email, AdminUser, AdminUserId};
use dialdesk_core::CoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

type AdminUserRow = (String, String, String, i64);

/// Admin accounts. Credentials arrive already hashed; this repo never sees
/// a plaintext password.
pub struct AdminUsersRepo<'a> {
    conn: &'a Connection,
}

impl<'a> AdminUsersRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, email: &str, password_hash: &str) -> Result<AdminUser> {
        let email = normalize_email(email).ok_or(CoreError::InvalidEmail)?;
        if self.find_by_email(&email)?.is_some() {
            return Err(StoreError::DuplicateEmail(email));
        }
        let user = AdminUser {
            id: AdminUserId::new(),
            email,
            password_hash: password_hash.to_string(),
            created_at: now_utc,
        };
        self.conn.execute(
            "INSERT INTO admin_users (id, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.created_at
            ],
        )?;
        Ok(user)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        let Some(email) = normalize_email(email) else {
            return Ok(None);
        };
        let row: Option<AdminUserRow> = self
            .conn
            .query_row(
                "SELECT id, email, password_hash, created_at
                 FROM admin_users
                 WHERE email = ?1;",
                [email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        row.map(into_admin_user).transpose()
    }

    pub fn list(&self) -> Result<Vec<AdminUser>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, password_hash, created_at
             FROM admin_users
             ORDER BY email ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(into_admin_user((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
            ))?);
        }
        Ok(users)
    }

    pub fn delete(&self, id: &AdminUserId) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM admin_users WHERE id = ?1;", [id.to_string()])?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("admin user {id}")));
        }
        Ok(())
    }
}

fn into_admin_user((id, email, password_hash, created_at): AdminUserRow) -> Result<AdminUser> {
    let id = AdminUserId::from_str(&id).map_err(|_| StoreError::InvalidId(id.clone()))?;
    Ok(AdminUser {
        id,
        email,
        password_hash,
        created_at,
    })
}
