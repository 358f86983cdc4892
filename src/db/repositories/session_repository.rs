use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

/// Scope name for the durable credential row. The ephemeral scope lives
/// in process memory and never reaches this table.
pub const SCOPE_DURABLE: &str = "durable";

#[derive(Debug, Clone)]
pub struct SessionCredentialRow {
    pub scope: String,
    pub token: String,
    pub user_json: String,
    pub saved_at: String,
}

impl TryFrom<&Row<'_>> for SessionCredentialRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            scope: row.get("scope")?,
            token: row.get("token")?,
            user_json: row.get("user_json")?,
            saved_at: row.get("saved_at")?,
        })
    }
}

pub struct SessionRepository;

impl SessionRepository {
    pub fn get(conn: &Connection, scope: &str) -> AppResult<Option<SessionCredentialRow>> {
        let mut stmt = conn.prepare(
            "SELECT scope, token, user_json, saved_at FROM session_credentials WHERE scope = ?1",
        )?;

        let row = stmt
            .query_row([scope], |row| SessionCredentialRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn upsert(conn: &Connection, scope: &str, token: &str, user_json: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO session_credentials (scope, token, user_json)
                VALUES (:scope, :token, :user_json)
                ON CONFLICT(scope) DO UPDATE SET
                    token = excluded.token,
                    user_json = excluded.user_json,
                    saved_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":scope": scope, ":token": token, ":user_json": user_json},
        )?;

        Ok(())
    }

    pub fn delete_all(conn: &Connection) -> AppResult<()> {
        conn.execute("DELETE FROM session_credentials", [])?;
        Ok(())
    }
}
