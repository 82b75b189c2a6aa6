use super::traits::{DatabaseClient, RefreshTokenRecord, User};
use crate::types::{AppError, Result, UserMeta};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database, Row, Value};
use tokio::sync::Mutex;

/// libsql-backed credential store.
///
/// All statements share one connection, and every statement runs under
/// `lock`. An open transaction is visible to anything else on the same
/// connection, so reads take the lock too and never observe uncommitted rows.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
    lock: Mutex<()>,
}

impl TursoClient {
    /// Ephemeral in-memory database.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;

        Self::from_database(db).await
    }

    /// File-backed database, creating parent directories as needed.
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", path, e)))?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self {
            _db: db,
            conn,
            lock: Mutex::new(()),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    email TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    name TEXT NOT NULL,
                    primary_contact_no TEXT,
                    user_meta TEXT,
                    is_verified INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS refresh_tokens (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    token_hash TEXT UNIQUE NOT NULL,
                    expires_at INTEGER NOT NULL,
                    user_agent TEXT,
                    ip_address TEXT,
                    created_at INTEGER NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id)
                )",
                (),
            )
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to create refresh_tokens table: {}", e))
            })?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user ON refresh_tokens(user_id)",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    async fn query_user(&self, sql: &str, key: &str) -> Result<Option<User>> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(sql, [key])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, name, primary_contact_no, user_meta, \
                            is_verified, created_at, updated_at";

fn text(row: &Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| AppError::Database(e.to_string()))
}

fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(AppError::Database(format!(
            "Unexpected value in column {}: {:?}",
            idx, other
        ))),
    }
}

fn integer(row: &Row, idx: i32) -> Result<i64> {
    row.get::<i64>(idx)
        .map_err(|e| AppError::Database(e.to_string()))
}

fn encode_meta(meta: &Option<UserMeta>) -> Result<Option<String>> {
    meta.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Failed to encode user metadata: {}", e)))
}

fn user_from_row(row: &Row) -> Result<User> {
    let user_meta = opt_text(row, 5)?
        .map(|raw| serde_json::from_str::<UserMeta>(&raw))
        .transpose()
        .map_err(|e| AppError::Database(format!("Corrupt user metadata: {}", e)))?;

    Ok(User {
        id: text(row, 0)?,
        email: text(row, 1)?,
        password_hash: text(row, 2)?,
        name: text(row, 3)?,
        primary_contact_no: opt_text(row, 4)?,
        user_meta,
        is_verified: integer(row, 6)? != 0,
        created_at: integer(row, 7)?,
        updated_at: integer(row, 8)?,
    })
}

fn token_from_row(row: &Row) -> Result<RefreshTokenRecord> {
    Ok(RefreshTokenRecord {
        id: text(row, 0)?,
        user_id: text(row, 1)?,
        token_hash: text(row, 2)?,
        expires_at: integer(row, 3)?,
        user_agent: opt_text(row, 4)?,
        ip_address: opt_text(row, 5)?,
        created_at: integer(row, 6)?,
    })
}

async fn insert_refresh_token(conn: &Connection, record: &RefreshTokenRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, user_agent, ip_address, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            record.id.as_str(),
            record.user_id.as_str(),
            record.token_hash.as_str(),
            record.expires_at,
            record.user_agent.as_deref(),
            record.ip_address.as_deref(),
            record.created_at,
        ),
    )
    .await
    .map_err(|e| AppError::Database(format!("Failed to store refresh token: {}", e)))?;

    Ok(())
}

async fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    let mut rows = conn
        .query("SELECT 1 FROM users WHERE email = ?", [user.email.as_str()])
        .await?;
    if rows.next().await?.is_some() {
        return Err(AppError::AlreadyExists(
            "User already exists with this email!".to_string(),
        ));
    }

    let meta = encode_meta(&user.user_meta)?;
    conn.execute(
        "INSERT INTO users (id, email, password_hash, name, primary_contact_no, user_meta, is_verified, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            user.id.as_str(),
            user.email.as_str(),
            user.password_hash.as_str(),
            user.name.as_str(),
            user.primary_contact_no.as_deref(),
            meta.as_deref(),
            i64::from(user.is_verified),
            user.created_at,
            user.updated_at,
        ),
    )
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE") {
            AppError::AlreadyExists("User already exists with this email!".to_string())
        } else {
            AppError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(())
}

#[async_trait]
impl DatabaseClient for TursoClient {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_user(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            email,
        )
        .await
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.query_user(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS), id)
            .await
    }

    async fn create_user_with_session(
        &self,
        user: &User,
        session: &RefreshTokenRecord,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let tx = self.conn.transaction().await?;

        let outcome = match insert_user(&tx, user).await {
            Ok(()) => insert_refresh_token(&tx, session).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "rollback after failed registration");
                }
                Err(e)
            }
        }
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let _guard = self.lock.lock().await;
        let meta = encode_meta(&user.user_meta)?;

        let updated = self
            .conn
            .execute(
                "UPDATE users SET name = ?, primary_contact_no = ?, user_meta = ?, updated_at = ?
                 WHERE id = ?",
                (
                    user.name.as_str(),
                    user.primary_contact_no.as_deref(),
                    meta.as_deref(),
                    user.updated_at,
                    user.id.as_str(),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?;

        if updated == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user.id)));
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let tx = self.conn.transaction().await?;

        let outcome = async {
            tx.execute("DELETE FROM refresh_tokens WHERE user_id = ?", [id])
                .await?;
            tx.execute("DELETE FROM users WHERE id = ?", [id]).await?;
            Ok::<_, libsql::Error>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "rollback after failed user deletion");
                }
                Err(AppError::Database(format!("Failed to delete user: {}", e)))
            }
        }
    }

    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        insert_refresh_token(&self.conn, record).await
    }

    async fn get_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, token_hash, expires_at, user_agent, ip_address, created_at
                 FROM refresh_tokens WHERE token_hash = ?",
                [token_hash],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query refresh token: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(token_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_refresh_tokens(&self, token_hash: &str) -> Result<u64> {
        let _guard = self.lock.lock().await;

        self.conn
            .execute("DELETE FROM refresh_tokens WHERE token_hash = ?", [token_hash])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete refresh token: {}", e)))
    }

    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        replacement: &RefreshTokenRecord,
        now: i64,
    ) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let tx = self.conn.transaction().await?;

        let deleted = match tx
            .execute(
                "DELETE FROM refresh_tokens WHERE token_hash = ? AND expires_at >= ?",
                (old_hash, now),
            )
            .await
        {
            Ok(n) => n,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "rollback after failed rotation");
                }
                return Err(AppError::Database(format!(
                    "Failed to revoke refresh token: {}",
                    e
                )));
            }
        };

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Err(e) = insert_refresh_token(&tx, replacement).await {
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, "rollback after failed rotation");
            }
            return Err(e);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_expired_refresh_tokens(&self, now: i64) -> Result<u64> {
        let _guard = self.lock.lock().await;

        self.conn
            .execute("DELETE FROM refresh_tokens WHERE expires_at < ?", [now])
            .await
            .map_err(|e| AppError::Database(format!("Failed to prune refresh tokens: {}", e)))
    }
}
