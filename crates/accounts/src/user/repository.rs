use crate::error::StoreError;
use crate::user::model::{UpdateOutcome, User};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = include_str!("../../migrations/001_create_users.sql");

/// Access to the user collection
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Email uniqueness is not checked.
    async fn insert(&self, user: &User) -> StoreResult<Uuid>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn list_all(&self) -> StoreResult<Vec<User>>;
    /// Set a single document field. Any key is accepted except the id.
    async fn update_field(&self, id: Uuid, key: &str, value: &str) -> StoreResult<UpdateOutcome>;
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<u64>;
}

/// Reject keys that would rewrite the identifier
pub(crate) fn ensure_mutable(key: &str) -> StoreResult<()> {
    match key {
        "id" | "_id" => Err(StoreError::ImmutableField(key.to_string())),
        _ => Ok(()),
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    document: Json<serde_json::Value>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        User::from_document(row.id, row.document.0)
    }
}

/// Users stored as JSONB documents in PostgreSQL
pub struct PostgresUserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Create the users table and its email index if they do not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        self.bounded(sqlx::raw_sql(SCHEMA).execute(&self.pool))
            .await?;
        Ok(())
    }

    async fn bounded<T, F>(&self, query: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &User) -> StoreResult<Uuid> {
        self.bounded(
            sqlx::query("INSERT INTO users (id, document) VALUES ($1, $2)")
                .bind(user.id)
                .bind(Json(user.to_document()))
                .execute(&self.pool),
        )
        .await?;

        Ok(user.id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(
                    r#"
                    SELECT id, document
                    FROM users
                    WHERE document->>'userEmail' = $1
                    ORDER BY created_at
                    LIMIT 1
                    "#,
                )
                .bind(email)
                .fetch_optional(&self.pool),
            )
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>("SELECT id, document FROM users WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn list_all(&self) -> StoreResult<Vec<User>> {
        let rows = self
            .bounded(
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, document FROM users ORDER BY created_at, id",
                )
                .fetch_all(&self.pool),
            )
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_field(&self, id: Uuid, key: &str, value: &str) -> StoreResult<UpdateOutcome> {
        ensure_mutable(key)?;

        // Matched and modified are counted separately so that setting a field
        // to its current value reports 1 matched / 0 modified.
        let (matched, modified): (i64, i64) = self
            .bounded(
                sqlx::query_as(
                    r#"
                    WITH target AS (
                        SELECT id, document FROM users WHERE id = $1
                    ),
                    updated AS (
                        UPDATE users u
                        SET document = jsonb_set(u.document, ARRAY[$2::text], to_jsonb($3::text), true)
                        FROM target t
                        WHERE u.id = t.id
                          AND t.document->$2::text IS DISTINCT FROM to_jsonb($3::text)
                        RETURNING u.id
                    )
                    SELECT
                        (SELECT COUNT(*) FROM target) AS matched,
                        (SELECT COUNT(*) FROM updated) AS modified
                    "#,
                )
                .bind(id)
                .bind(key)
                .bind(value)
                .fetch_one(&self.pool),
            )
            .await?;

        Ok(UpdateOutcome {
            matched_count: matched as u64,
            modified_count: modified as u64,
        })
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<u64> {
        let result = self
            .bounded(
                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_keys_are_immutable() {
        assert!(matches!(
            ensure_mutable("id"),
            Err(StoreError::ImmutableField(_))
        ));
        assert!(ensure_mutable("_id").is_err());
        assert!(ensure_mutable("fullName").is_ok());
        assert!(ensure_mutable("anything").is_ok());
    }

    #[tokio::test]
    async fn test_slow_call_surfaces_as_timeout() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:5432/accounts")
            .unwrap();
        let repo = PostgresUserRepository::new(pool, Duration::from_millis(20));

        let result = repo
            .bounded(std::future::pending::<Result<(), sqlx::Error>>())
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Timeout(limit)) if limit == Duration::from_millis(20)
        ));
    }

    #[test]
    fn test_schema_creates_users_table() {
        assert!(SCHEMA.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(SCHEMA.contains("document JSONB NOT NULL"));
    }
}
