//! Database transaction utilities
//!
//! `with_transaction` begins a transaction, runs the provided closure, and
//! commits on success or rolls back on error. Both paths release the
//! connection back to the pool; the closure can never leak an open
//! transaction. Database failures anywhere in the transactional section come
//! back as `AppError::Transaction` carrying the underlying cause, so clients
//! see a stable "update failed" message; domain errors raised by the closure
//! (NotFound, Conflict, ...) pass through untouched.

use livraria_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use std::pin::Pin;

pub async fn with_transaction<T, F>(pool: &PgPool, f: F) -> Result<T, AppError>
where
    F: for<'a> FnOnce(
        &'a mut Transaction<'_, Postgres>,
    ) -> Pin<
        Box<dyn std::future::Future<Output = Result<T, AppError>> + Send + 'a>,
    >,
{
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to begin transaction");
        AppError::Transaction(e.to_string())
    })?;

    match f(&mut tx).await {
        Ok(result) => {
            tx.commit().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to commit transaction");
                AppError::Transaction(e.to_string())
            })?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(
                    error = %rollback_err,
                    original_error = %e,
                    "Failed to rollback transaction"
                );
            }
            Err(into_rollback_cause(e))
        }
    }
}

fn into_rollback_cause(err: AppError) -> AppError {
    match err {
        AppError::Database(e) => AppError::Transaction(e.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_surface_as_transaction_failures() {
        let wrapped = into_rollback_cause(AppError::Database(sqlx::Error::RowNotFound));
        assert!(matches!(wrapped, AppError::Transaction(_)));
    }

    #[test]
    fn domain_errors_pass_through_rollback() {
        let err = into_rollback_cause(AppError::NotFound("missing".to_string()));
        assert!(matches!(err, AppError::NotFound(_)));

        let err = into_rollback_cause(AppError::Conflict("taken".to_string()));
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
