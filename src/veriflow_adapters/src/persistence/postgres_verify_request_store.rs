use sqlx::{Pool, Postgres, types::Json};
use veriflow_core::{
    Email, MessageRef, StatusUpdate, VerifyRequest, VerifyRequestId, VerifyRequestStore,
    VerifyRequestStoreError, VerifyStatus,
};

#[derive(Clone)]
pub struct PostgresVerifyRequestStore {
    pool: sqlx::PgPool,
}

impl PostgresVerifyRequestStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PostgresVerifyRequestStore { pool }
    }

    async fn list_where(
        &self,
        column: &'static str,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        let sql = format!(
            "SELECT body FROM verify_requests WHERE {column} = $1 ORDER BY started_at DESC"
        );
        let rows: Vec<Json<VerifyRequest>> = sqlx::query_scalar(&sql)
            .bind(email.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(rows.into_iter().map(|Json(request)| request).collect())
    }
}

fn unexpected(e: sqlx::Error) -> VerifyRequestStoreError {
    VerifyRequestStoreError::UnexpectedError(e.to_string())
}

#[async_trait::async_trait]
impl VerifyRequestStore for PostgresVerifyRequestStore {
    #[tracing::instrument(
        name = "Inserting verify request into PostgreSQL",
        skip_all,
        fields(request_id = %request.id())
    )]
    async fn insert_request(&self, request: VerifyRequest) -> Result<(), VerifyRequestStoreError> {
        let query = sqlx::query(
            r#"
                INSERT INTO verify_requests
                    (id, status, requestor_email, recipient_email, started_at, body)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.status().as_str())
        .bind(request.requestor().email.as_str())
        .bind(request.recipient().email.as_str())
        .bind(request.start())
        .bind(Json(&request));

        query.execute(&self.pool).await.map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.constraint().is_some() {
                    return VerifyRequestStoreError::RequestAlreadyExists;
                }
            }
            unexpected(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving verify request from PostgreSQL", skip_all)]
    async fn get_request(
        &self,
        id: &VerifyRequestId,
    ) -> Result<VerifyRequest, VerifyRequestStoreError> {
        let row: Option<Json<VerifyRequest>> =
            sqlx::query_scalar("SELECT body FROM verify_requests WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;

        let Some(Json(request)) = row else {
            return Err(VerifyRequestStoreError::RequestNotFound);
        };
        Ok(request)
    }

    async fn list_by_requestor(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        self.list_where("requestor_email", email).await
    }

    async fn list_by_recipient(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        self.list_where("recipient_email", email).await
    }

    #[tracing::instrument(
        name = "Conditional status update in PostgreSQL",
        skip_all,
        fields(request_id = %request.id(), expected = %expected, next = %request.status())
    )]
    async fn update_if_status(
        &self,
        expected: VerifyStatus,
        request: &VerifyRequest,
    ) -> Result<StatusUpdate, VerifyRequestStoreError> {
        // Artifacts and permalink belong to the notification worker, so the
        // stored values are merged back over the incoming document.
        let query = sqlx::query(
            r#"
                UPDATE verify_requests
                SET status = $3,
                    body = $4::jsonb
                        || jsonb_build_object(
                            'artifacts', COALESCE(body -> 'artifacts', '[]'::jsonb),
                            'permalink', COALESCE(body -> 'permalink', 'null'::jsonb)
                        )
                WHERE id = $1 AND status = $2
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(expected.as_str())
        .bind(request.status().as_str())
        .bind(Json(request));

        let result = query.execute(&self.pool).await.map_err(unexpected)?;
        if result.rows_affected() == 1 {
            return Ok(StatusUpdate::Applied);
        }

        let current = self.get_request(request.id()).await?;
        Ok(StatusUpdate::Rejected(Box::new(current)))
    }

    #[tracing::instrument(name = "Attaching artifacts in PostgreSQL", skip_all)]
    async fn attach_artifacts(
        &self,
        id: &VerifyRequestId,
        artifacts: Vec<MessageRef>,
    ) -> Result<(), VerifyRequestStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE verify_requests
                SET body = jsonb_set(
                    body,
                    '{artifacts}',
                    COALESCE(body -> 'artifacts', '[]'::jsonb) || $2::jsonb
                )
                WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(Json(&artifacts))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(VerifyRequestStoreError::RequestNotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Setting permalink in PostgreSQL", skip_all)]
    async fn set_permalink(
        &self,
        id: &VerifyRequestId,
        permalink: String,
    ) -> Result<(), VerifyRequestStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE verify_requests
                SET body = jsonb_set(body, '{permalink}', to_jsonb($2::text))
                WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(permalink)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(VerifyRequestStoreError::RequestNotFound);
        }
        Ok(())
    }
}
