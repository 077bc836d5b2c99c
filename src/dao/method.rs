use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::{EntityDao, check_single_row_updated, handle_database_error},
    model::{
        apperror::{ApplicationError, ErrorType},
        graph::EntityGraph,
        models::Method,
    },
};

/**
 * Database response type for method rows.
 */
pub type QueryMethodDbResp = (i64, Option<String>, Option<i64>, Option<i64>);

const NEXT_METHOD_ID: &str = "SELECT nextval('method_id_seq')";

/**
 * SQL query to add a method. The pair column is written separately.
 */
const ADD_METHOD: &str = "INSERT INTO method (id, name, consumption_id) VALUES ($1, $2, $3)";

const UPDATE_METHOD: &str = "UPDATE method SET name = $1, consumption_id = $2 WHERE id = $3";

const UPDATE_METHOD_PAIR: &str = "UPDATE method SET method_id = $1 WHERE id = $2";

const QUERY_METHOD: &str = "SELECT id, name, method_id, consumption_id FROM method WHERE id = $1";

const QUERY_METHODS_BY_IDS: &str = "SELECT id, name, method_id, consumption_id FROM method WHERE id = ANY($1)";

const QUERY_METHOD_LIST: &str = "SELECT id, name, method_id, consumption_id FROM method ORDER BY id";

const EXISTS_METHOD: &str = "SELECT EXISTS(SELECT 1 FROM method WHERE id = $1)";

const DELETE_METHOD: &str = "DELETE FROM method WHERE id = $1";

impl From<QueryMethodDbResp> for Method {
    fn from((id, name, method_id, consumption_id): QueryMethodDbResp) -> Self {
        Method { id: Some(id), name, method_id, consumption_id }
    }
}

/**
 * DAO for the method table.
 */
pub struct MethodDao {}

impl MethodDao {
    pub fn new() -> Self {
        MethodDao {}
    }

    /**
     * Pairs the method with `paired_method_id` and stores the change on every method involved.
     *
     * The method, its current partner, the new partner and the new partner's current partner are
     * loaded into an `EntityGraph`; after pairing in the graph every pair column that changed is
     * cleared first and then written, so the unique pair column never holds a duplicate.
     *
     * # Arguments
     * `connection`: The database connection, normally a transaction.
     * `method_id`: The method being paired.
     * `paired_method_id`: The new partner, or `None` to unpair.
     */
    #[instrument(skip(self, connection), fields(result))]
    async fn update_pairing(&self, connection: &mut PgConnection, method_id: i64, paired_method_id: Option<i64>) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        if paired_method_id == Some(method_id) {
            return Err(ApplicationError::new(ErrorType::ConstraintViolation, "A method cannot be paired with itself".to_string()));
        }
        let mut ids: Vec<i64> = vec![method_id];
        ids.extend(paired_method_id);
        let mut loaded = self.find_by_ids(connection, &ids).await?;
        let partners_of_loaded: Vec<i64> = loaded.iter().filter_map(|method| method.method_id).filter(|id| !ids.contains(id)).collect();
        loaded.extend(self.find_by_ids(connection, &partners_of_loaded).await?);

        let mut graph = EntityGraph::new();
        for method in loaded {
            graph.attach_method(method);
        }
        graph.resolve_loaded_links();
        let Some(method) = graph.find_method(method_id) else {
            return Err(ApplicationError::new(ErrorType::NotFound, "Method not found".to_string()));
        };
        let paired_method = match paired_method_id {
            Some(paired_method_id) => {
                let Some(paired_method) = graph.find_method(paired_method_id) else {
                    return Err(ApplicationError::new(ErrorType::ConstraintViolation, "Missing parent value".to_string()));
                };
                Some(paired_method)
            }
            None => None,
        };
        graph.set_paired_method(method, paired_method);

        let updates = graph.method_pair_updates();
        for (id, _) in &updates {
            let result = sqlx::query(UPDATE_METHOD_PAIR).bind(None::<i64>).bind(id).execute(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
            check_single_row_updated(result.rows_affected(), "Method", *id)?;
        }
        for (id, partner) in updates.iter().filter(|(_, partner)| partner.is_some()) {
            sqlx::query(UPDATE_METHOD_PAIR).bind(partner).bind(id).execute(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
        }
        tracing::debug!("Updated pair columns of {} methods", updates.len());
        Ok(())
    }

    async fn find_by_ids(&self, connection: &mut PgConnection, ids: &[i64]) -> Result<Vec<Method>, ApplicationError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let span = tracing::Span::current();
        let results: Vec<QueryMethodDbResp> = sqlx::query_as(QUERY_METHODS_BY_IDS).bind(ids).fetch_all(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(results.into_iter().map(Method::from).collect())
    }
}

impl EntityDao<Method> for MethodDao {
    #[instrument(skip(self, connection), fields(result))]
    async fn save(&self, connection: &mut PgConnection, method: Method) -> Result<Method, ApplicationError> {
        let span = tracing::Span::current();
        let (id, previous_pair) = match method.id {
            Some(id) => {
                let previous_pair = self.find_by_id(connection, id).await?.and_then(|previous| previous.method_id);
                let result = sqlx::query(UPDATE_METHOD)
                    .bind(&method.name)
                    .bind(method.consumption_id)
                    .bind(id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                check_single_row_updated(result.rows_affected(), "Method", id)?;
                (id, previous_pair)
            }
            None => {
                let next_id: (i64,) = sqlx::query_as(NEXT_METHOD_ID).fetch_one(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
                sqlx::query(ADD_METHOD)
                    .bind(next_id.0)
                    .bind(&method.name)
                    .bind(method.consumption_id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                (next_id.0, None)
            }
        };
        if previous_pair != method.method_id {
            self.update_pairing(connection, id, method.method_id).await?;
        }
        Ok(Method { id: Some(id), ..method })
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<Option<Method>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryMethodDbResp> = sqlx::query_as(QUERY_METHOD).bind(id).fetch_optional(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(result.map(Method::from))
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_all(&self, connection: &mut PgConnection) -> Result<Vec<Method>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryMethodDbResp> = sqlx::query_as(QUERY_METHOD_LIST).fetch_all(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(results.into_iter().map(Method::from).collect())
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn exists_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<bool, ApplicationError> {
        let span = tracing::Span::current();
        let exists: (bool,) = sqlx::query_as(EXISTS_METHOD).bind(id).fetch_one(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(exists.0)
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn delete_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_METHOD).bind(id).execute(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Method with ID {} not found for deletion", id);
        }
        Ok(())
    }
}
