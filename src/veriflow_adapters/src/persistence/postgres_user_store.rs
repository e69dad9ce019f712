use sqlx::{Pool, Postgres, types::Json};
use veriflow_core::{Email, User, UserId, UserStore, UserStoreError};

/// Users are stored as JSONB documents keyed by id, with the e-mail in its own
/// indexed column for lookups.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: sqlx::PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PostgresUserStore { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(
        name = "Saving user to PostgreSQL",
        skip_all,
        fields(user_id = %user.id())
    )]
    async fn save_user(&self, user: User) -> Result<(), UserStoreError> {
        let query = sqlx::query(
            r#"
                INSERT INTO users (id, email, body)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO UPDATE
                SET email = EXCLUDED.email, body = EXCLUDED.body
            "#,
        )
        .bind(user.id().as_str())
        .bind(user.email().as_str())
        .bind(Json(&user));

        query
            .execute(&self.pool)
            .await
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving user from PostgreSQL", skip_all)]
    async fn get_user(&self, id: &UserId) -> Result<User, UserStoreError> {
        let row: Option<Json<User>> = sqlx::query_scalar("SELECT body FROM users WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        let Some(Json(user)) = row else {
            return Err(UserStoreError::UserNotFound);
        };
        Ok(user)
    }

    #[tracing::instrument(name = "Retrieving user by e-mail from PostgreSQL", skip_all)]
    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        let row: Option<Json<User>> =
            sqlx::query_scalar("SELECT body FROM users WHERE email = $1 LIMIT 1")
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        let Some(Json(user)) = row else {
            return Err(UserStoreError::UserNotFound);
        };
        Ok(user)
    }
}
