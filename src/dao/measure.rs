use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::{EntityDao, check_single_row_updated, handle_database_error, stored_precision},
    model::{apperror::ApplicationError, models::Measure},
};

/**
 * Database response type for measure rows.
 */
pub type QueryMeasureDbResp = (i64, Option<DateTime<Utc>>, Option<i64>);

const NEXT_MEASURE_ID: &str = "SELECT nextval('measure_id_seq')";

const ADD_MEASURE: &str = "INSERT INTO measure (id, start_timestamp, consumption_id) VALUES ($1, $2, $3)";

const UPDATE_MEASURE: &str = "UPDATE measure SET start_timestamp = $1, consumption_id = $2 WHERE id = $3";

const QUERY_MEASURE: &str = "SELECT id, start_timestamp, consumption_id FROM measure WHERE id = $1";

const QUERY_MEASURE_LIST: &str = "SELECT id, start_timestamp, consumption_id FROM measure ORDER BY id";

const EXISTS_MEASURE: &str = "SELECT EXISTS(SELECT 1 FROM measure WHERE id = $1)";

const DELETE_MEASURE: &str = "DELETE FROM measure WHERE id = $1";

impl From<QueryMeasureDbResp> for Measure {
    fn from((id, start_timestamp, consumption_id): QueryMeasureDbResp) -> Self {
        Measure { id: Some(id), start_timestamp, consumption_id }
    }
}

/**
 * DAO for the measure table.
 */
pub struct MeasureDao {}

impl MeasureDao {
    pub fn new() -> Self {
        MeasureDao {}
    }
}

impl EntityDao<Measure> for MeasureDao {
    #[instrument(skip(self, connection), fields(result))]
    async fn save(&self, connection: &mut PgConnection, measure: Measure) -> Result<Measure, ApplicationError> {
        let span = tracing::Span::current();
        let measure = Measure { start_timestamp: stored_precision(measure.start_timestamp), ..measure };
        let id = match measure.id {
            Some(id) => {
                let result = sqlx::query(UPDATE_MEASURE)
                    .bind(measure.start_timestamp)
                    .bind(measure.consumption_id)
                    .bind(id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                check_single_row_updated(result.rows_affected(), "Measure", id)?;
                id
            }
            None => {
                let next_id: (i64,) = sqlx::query_as(NEXT_MEASURE_ID).fetch_one(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
                sqlx::query(ADD_MEASURE)
                    .bind(next_id.0)
                    .bind(measure.start_timestamp)
                    .bind(measure.consumption_id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                next_id.0
            }
        };
        Ok(Measure { id: Some(id), ..measure })
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<Option<Measure>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryMeasureDbResp> = sqlx::query_as(QUERY_MEASURE).bind(id).fetch_optional(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(result.map(Measure::from))
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_all(&self, connection: &mut PgConnection) -> Result<Vec<Measure>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryMeasureDbResp> = sqlx::query_as(QUERY_MEASURE_LIST).fetch_all(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(results.into_iter().map(Measure::from).collect())
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn exists_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<bool, ApplicationError> {
        let span = tracing::Span::current();
        let exists: (bool,) = sqlx::query_as(EXISTS_MEASURE).bind(id).fetch_one(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(exists.0)
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn delete_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_MEASURE).bind(id).execute(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Measure with ID {} not found for deletion", id);
        }
        Ok(())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::dao::{consumption::ConsumptionDao, test_support::init_db};
    use crate::model::{apperror::ErrorType, models::Consumption};

    #[sqlx::test]
    async fn test_save_with_consumption() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let consumption = ConsumptionDao::new().save(&mut transaction, Consumption::new().with_value(1)).await.unwrap();
        let measure_dao = MeasureDao::new();
        let start_timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let saved = measure_dao.save(&mut transaction, Measure::new().with_start_timestamp(start_timestamp).with_consumption_id(consumption.id.unwrap())).await.unwrap();
        let found = measure_dao.find_by_id(&mut transaction, saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.start_timestamp, Some(start_timestamp));
        assert_eq!(found.consumption_id, consumption.id);
        transaction.rollback().await.unwrap();
    }

    #[sqlx::test]
    async fn test_save_with_missing_consumption() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let result = MeasureDao::new().save(&mut transaction, Measure::new().with_consumption_id(i64::MAX)).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::ConstraintViolation);
        transaction.rollback().await.unwrap();
    }
}
