use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::{EntityDao, check_single_row_updated, handle_database_error, stored_precision},
    model::{
        apperror::ApplicationError,
        models::{Consumption, MonitoringType, Scope},
    },
};

/**
 * Database response type for consumption rows.
 */
pub type QueryConsumptionDbResp = (i64, Option<i64>, Option<String>, Option<String>, Option<DateTime<Utc>>);

/**
 * SQL query next consumption id.
 */
const NEXT_CONSUMPTION_ID: &str = "SELECT nextval('consumption_id_seq')";

/**
 * SQL query to add a consumption.
 */
const ADD_CONSUMPTION: &str = "INSERT INTO consumption (id, value, scope, monitoring_type, timestamp) VALUES ($1, $2, $3, $4, $5)";

/**
 * SQL query to update a consumption.
 */
const UPDATE_CONSUMPTION: &str = "UPDATE consumption SET value = $1, scope = $2, monitoring_type = $3, timestamp = $4 WHERE id = $5";

/**
 * SQL query to retrieve a consumption.
 */
const QUERY_CONSUMPTION: &str = "SELECT id, value, scope, monitoring_type, timestamp FROM consumption WHERE id = $1";

/**
 * SQL query to retrieve all consumptions.
 */
const QUERY_CONSUMPTION_LIST: &str = "SELECT id, value, scope, monitoring_type, timestamp FROM consumption ORDER BY id";

/**
 * SQL query to check that a consumption exists.
 */
const EXISTS_CONSUMPTION: &str = "SELECT EXISTS(SELECT 1 FROM consumption WHERE id = $1)";

/**
 * SQL query to delete a consumption.
 */
const DELETE_CONSUMPTION: &str = "DELETE FROM consumption WHERE id = $1";

impl TryFrom<QueryConsumptionDbResp> for Consumption {
    type Error = ApplicationError;

    fn try_from((id, value, scope, monitoring_type, timestamp): QueryConsumptionDbResp) -> Result<Self, Self::Error> {
        Ok(Consumption {
            id: Some(id),
            value,
            scope: scope.as_deref().map(Scope::from_str).transpose()?,
            monitoring_type: monitoring_type.as_deref().map(MonitoringType::from_str).transpose()?,
            timestamp,
        })
    }
}

/**
 * DAO for the consumption table.
 */
pub struct ConsumptionDao {}

impl ConsumptionDao {
    pub fn new() -> Self {
        ConsumptionDao {}
    }
}

impl EntityDao<Consumption> for ConsumptionDao {
    #[instrument(skip(self, connection), fields(result))]
    async fn save(&self, connection: &mut PgConnection, consumption: Consumption) -> Result<Consumption, ApplicationError> {
        let span = tracing::Span::current();
        let consumption = Consumption { timestamp: stored_precision(consumption.timestamp), ..consumption };
        let scope = consumption.scope.map(Scope::as_str);
        let monitoring_type = consumption.monitoring_type.map(MonitoringType::as_str);
        let id = match consumption.id {
            Some(id) => {
                let result = sqlx::query(UPDATE_CONSUMPTION)
                    .bind(consumption.value)
                    .bind(scope)
                    .bind(monitoring_type)
                    .bind(consumption.timestamp)
                    .bind(id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                check_single_row_updated(result.rows_affected(), "Consumption", id)?;
                id
            }
            None => {
                let next_id: (i64,) = sqlx::query_as(NEXT_CONSUMPTION_ID).fetch_one(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
                sqlx::query(ADD_CONSUMPTION)
                    .bind(next_id.0)
                    .bind(consumption.value)
                    .bind(scope)
                    .bind(monitoring_type)
                    .bind(consumption.timestamp)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                next_id.0
            }
        };
        Ok(Consumption { id: Some(id), ..consumption })
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<Option<Consumption>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryConsumptionDbResp> = sqlx::query_as(QUERY_CONSUMPTION).bind(id).fetch_optional(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        result.map(Consumption::try_from).transpose()
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_all(&self, connection: &mut PgConnection) -> Result<Vec<Consumption>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryConsumptionDbResp> = sqlx::query_as(QUERY_CONSUMPTION_LIST).fetch_all(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        results.into_iter().map(Consumption::try_from).collect()
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn exists_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<bool, ApplicationError> {
        let span = tracing::Span::current();
        let exists: (bool,) = sqlx::query_as(EXISTS_CONSUMPTION).bind(id).fetch_one(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(exists.0)
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn delete_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_CONSUMPTION).bind(id).execute(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Consumption with ID {} not found for deletion", id);
        }
        Ok(())
    }
}
