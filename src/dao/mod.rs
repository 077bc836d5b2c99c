pub mod consumption;
pub mod measure;
pub mod method;
pub mod release;
pub mod software;

use std::borrow::Cow;

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::PgConnection;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::Entity,
};

/**
 * Persistence operations shared by every entity.
 */
#[allow(async_fn_in_trait)]
pub trait EntityDao<E: Entity> {
    /**
     * Inserts the entity when it has no id, otherwise updates the row with that id.
     *
     * # Returns
     * The persisted entity carrying its id.
     */
    async fn save(&self, connection: &mut PgConnection, entity: E) -> Result<E, ApplicationError>;

    /**
     * Finds an entity by id.
     */
    async fn find_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<Option<E>, ApplicationError>;

    /**
     * Returns every entity ordered by id.
     */
    async fn find_all(&self, connection: &mut PgConnection) -> Result<Vec<E>, ApplicationError>;

    /**
     * Checks whether a row with the id exists.
     */
    async fn exists_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<bool, ApplicationError>;

    /**
     * Deletes the row with the id. Deleting a missing id is not an error.
     */
    async fn delete_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<(), ApplicationError>;

    /**
     * Returns every entity with its many-to-many collections loaded.
     */
    async fn find_all_with_eager_relationships(&self, connection: &mut PgConnection) -> Result<Vec<E>, ApplicationError> {
        self.find_all(connection).await
    }

    /**
     * Finds an entity by id with its many-to-many collections loaded.
     */
    async fn find_one_with_eager_relationships(&self, connection: &mut PgConnection, id: i64) -> Result<Option<E>, ApplicationError> {
        self.find_by_id(connection, id).await
    }
}

/**
 * Checks that exactly one row was touched by an update.
 *
 * # Arguments
 * `rows_affected`: Number of rows reported by the database.
 * `entity_name`: Name of the entity used in the error message.
 * `id`: Id of the updated row.
 */
pub fn check_single_row_updated(rows_affected: u64, entity_name: &str, id: i64) -> Result<(), ApplicationError> {
    if rows_affected == 0 {
        tracing::debug!("{} with id {} not found for update", entity_name, id);
        return Err(ApplicationError::new(ErrorType::NotFound, format!("{entity_name} not found")));
    }
    if rows_affected > 1 {
        tracing::warn!("Multiple {} rows attempted updated. Rolled back", entity_name);
        return Err(ApplicationError::new(ErrorType::Application, format!("Multiple {entity_name} rows attempted updated. Rolled back")));
    }
    Ok(())
}

/**
 * Truncates a timestamp to the microseconds a `TIMESTAMPTZ` column keeps, so a saved entity
 * equals the one read back.
 */
pub fn stored_precision(timestamp: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    timestamp.map(|timestamp| timestamp.trunc_subsecs(6))
}

/**
 * Handles database errors and maps them to application errors.
 *
 * # Arguments
 * `error`: The database error to handle.
 *
 * # Returns
 * An `ApplicationError` corresponding to the database error.
 */
pub fn handle_database_error(error: &sqlx::Error) -> ApplicationError {
    if let Some(db_error) = error.as_database_error() {
        tracing::debug!("Database error: {}", db_error);
        tracing::info!("Add/Update error: {:?}", db_error.code());
        if db_error.code() == Some(Cow::Borrowed("23505")) {
            // Unique violation
            return ApplicationError::new(ErrorType::ConstraintViolation, "Already exists".to_string());
        } else if db_error.code() == Some(Cow::Borrowed("23503")) {
            // Foreign key violation
            return ApplicationError::new(ErrorType::ConstraintViolation, "Missing parent value".to_string());
        } else if db_error.code() == Some(Cow::Borrowed("22001")) {
            // Value too long
            return ApplicationError::new(ErrorType::ConstraintViolation, "Value too long".to_string());
        }
        tracing::error!("Unhandled database error: {}", db_error);
        return ApplicationError::new(ErrorType::DatabaseError, "Unhandled database error".to_string());
    }
    tracing::error!("Failed to execute database operation: {}", error);
    ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute database operation: {error}"))
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
pub mod test_support {
    use sqlx::PgPool;

    /**
     * Initialize the database connection pool.
     */
    pub async fn init_db() -> PgPool {
        dotenv::from_filename("./sqlx-postgresql-migration/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&pool).await.unwrap();
        pool
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_single_row_updated() {
        assert!(check_single_row_updated(1, "Method", 1).is_ok());
        assert_eq!(check_single_row_updated(0, "Method", 1).unwrap_err().error_type, ErrorType::NotFound);
        assert_eq!(check_single_row_updated(2, "Method", 1).unwrap_err().error_type, ErrorType::Application);
    }

    #[test]
    fn test_stored_precision() {
        let timestamp = DateTime::parse_from_rfc3339("2023-11-14T22:13:20.123456789Z").unwrap().with_timezone(&Utc);
        let expected = DateTime::parse_from_rfc3339("2023-11-14T22:13:20.123456Z").unwrap().with_timezone(&Utc);
        assert_eq!(stored_precision(Some(timestamp)), Some(expected));
        assert_eq!(stored_precision(Some(expected)), Some(expected));
        assert_eq!(stored_precision(None), None);
    }

    #[test]
    fn test_non_database_error_is_database_error() {
        let error = handle_database_error(&sqlx::Error::RowNotFound);
        assert_eq!(error.error_type, ErrorType::DatabaseError);
    }
}
