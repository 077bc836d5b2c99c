use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::{EntityDao, check_single_row_updated, handle_database_error, stored_precision},
    model::{apperror::ApplicationError, models::Release},
};

/**
 * Database response type for release rows.
 */
pub type QueryReleaseDbResp = (i64, Option<String>, Option<DateTime<Utc>>, Option<String>);

/**
 * Database response type for release rows with their method ids.
 */
pub type QueryReleaseEagerDbResp = (i64, Option<String>, Option<DateTime<Utc>>, Option<String>, Vec<i64>);

const NEXT_RELEASE_ID: &str = "SELECT nextval('jhi_release_id_seq')";

const ADD_RELEASE: &str = "INSERT INTO jhi_release (id, name, date, description) VALUES ($1, $2, $3, $4)";

const UPDATE_RELEASE: &str = "UPDATE jhi_release SET name = $1, date = $2, description = $3 WHERE id = $4";

const QUERY_RELEASE: &str = "SELECT id, name, date, description FROM jhi_release WHERE id = $1";

const QUERY_RELEASE_LIST: &str = "SELECT id, name, date, description FROM jhi_release ORDER BY id";

/**
 * SQL query to retrieve releases with the ids of their methods in a single fetch.
 */
const QUERY_RELEASE_LIST_EAGER: &str = "SELECT r.id, r.name, r.date, r.description,
                                        COALESCE(array_agg(rm.method_id ORDER BY rm.method_id) FILTER (WHERE rm.method_id IS NOT NULL), '{}')
                                        FROM jhi_release r
                                        LEFT JOIN rel_jhi_release__method rm ON rm.jhi_release_id = r.id
                                        WHERE ($1::bigint IS NULL OR r.id = $1)
                                        GROUP BY r.id
                                        ORDER BY r.id";

const EXISTS_RELEASE: &str = "SELECT EXISTS(SELECT 1 FROM jhi_release WHERE id = $1)";

const DELETE_RELEASE: &str = "DELETE FROM jhi_release WHERE id = $1";

const DELETE_RELEASE_METHODS: &str = "DELETE FROM rel_jhi_release__method WHERE jhi_release_id = $1";

const ADD_RELEASE_METHODS: &str = "INSERT INTO rel_jhi_release__method (jhi_release_id, method_id) SELECT $1, unnest($2::bigint[])";

impl From<QueryReleaseDbResp> for Release {
    fn from((id, name, date, description): QueryReleaseDbResp) -> Self {
        Release { id: Some(id), name, date, description, method_ids: None }
    }
}

impl From<QueryReleaseEagerDbResp> for Release {
    fn from((id, name, date, description, method_ids): QueryReleaseEagerDbResp) -> Self {
        Release { id: Some(id), name, date, description, method_ids: Some(method_ids) }
    }
}

/**
 * DAO for the release table and its method join table.
 */
pub struct ReleaseDao {}

impl ReleaseDao {
    pub fn new() -> Self {
        ReleaseDao {}
    }

    /**
     * Replaces the methods of a release in the join table.
     *
     * Only the rows of this release are rewritten.
     *
     * # Arguments
     * `connection`: The database connection.
     * `release_id`: The release whose methods are replaced.
     * `method_ids`: The new method ids, duplicates are ignored.
     */
    #[instrument(skip(self, connection), fields(result))]
    async fn replace_methods(&self, connection: &mut PgConnection, release_id: i64, method_ids: &[i64]) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let method_ids: Vec<i64> = method_ids.iter().copied().collect::<BTreeSet<i64>>().into_iter().collect();
        sqlx::query(DELETE_RELEASE_METHODS).bind(release_id).execute(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
        if !method_ids.is_empty() {
            sqlx::query(ADD_RELEASE_METHODS).bind(release_id).bind(&method_ids).execute(&mut *connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        }
        Ok(())
    }

    async fn query_eager(&self, connection: &mut PgConnection, id: Option<i64>) -> Result<Vec<Release>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryReleaseEagerDbResp> = sqlx::query_as(QUERY_RELEASE_LIST_EAGER).bind(id).fetch_all(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(results.into_iter().map(Release::from).collect())
    }
}

impl EntityDao<Release> for ReleaseDao {
    #[instrument(skip(self, connection), fields(result))]
    async fn save(&self, connection: &mut PgConnection, release: Release) -> Result<Release, ApplicationError> {
        let span = tracing::Span::current();
        let release = Release { date: stored_precision(release.date), ..release };
        let id = match release.id {
            Some(id) => {
                let result = sqlx::query(UPDATE_RELEASE)
                    .bind(&release.name)
                    .bind(release.date)
                    .bind(&release.description)
                    .bind(id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                check_single_row_updated(result.rows_affected(), "Release", id)?;
                id
            }
            None => {
                let next_id: (i64,) = sqlx::query_as(NEXT_RELEASE_ID).fetch_one(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
                sqlx::query(ADD_RELEASE)
                    .bind(next_id.0)
                    .bind(&release.name)
                    .bind(release.date)
                    .bind(&release.description)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                next_id.0
            }
        };
        if let Some(method_ids) = &release.method_ids {
            self.replace_methods(connection, id, method_ids).await?;
        }
        Ok(Release { id: Some(id), ..release })
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<Option<Release>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryReleaseDbResp> = sqlx::query_as(QUERY_RELEASE).bind(id).fetch_optional(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(result.map(Release::from))
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_all(&self, connection: &mut PgConnection) -> Result<Vec<Release>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryReleaseDbResp> = sqlx::query_as(QUERY_RELEASE_LIST).fetch_all(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(results.into_iter().map(Release::from).collect())
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn exists_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<bool, ApplicationError> {
        let span = tracing::Span::current();
        let exists: (bool,) = sqlx::query_as(EXISTS_RELEASE).bind(id).fetch_one(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(exists.0)
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn delete_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_RELEASE).bind(id).execute(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Release with ID {} not found for deletion", id);
        }
        Ok(())
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_all_with_eager_relationships(&self, connection: &mut PgConnection) -> Result<Vec<Release>, ApplicationError> {
        self.query_eager(connection, None).await
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_one_with_eager_relationships(&self, connection: &mut PgConnection, id: i64) -> Result<Option<Release>, ApplicationError> {
        Ok(self.query_eager(connection, Some(id)).await?.into_iter().next())
    }
}
