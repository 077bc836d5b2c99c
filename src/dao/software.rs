use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::{EntityDao, check_single_row_updated, handle_database_error},
    model::{apperror::ApplicationError, models::Software},
};

/**
 * Database response type for software rows.
 */
pub type QuerySoftwareDbResp = (i64, Option<String>, Option<i64>);

const NEXT_SOFTWARE_ID: &str = "SELECT nextval('software_id_seq')";

const ADD_SOFTWARE: &str = "INSERT INTO software (id, name, release_id) VALUES ($1, $2, $3)";

const UPDATE_SOFTWARE: &str = "UPDATE software SET name = $1, release_id = $2 WHERE id = $3";

const QUERY_SOFTWARE: &str = "SELECT id, name, release_id FROM software WHERE id = $1";

const QUERY_SOFTWARE_LIST: &str = "SELECT id, name, release_id FROM software ORDER BY id";

const EXISTS_SOFTWARE: &str = "SELECT EXISTS(SELECT 1 FROM software WHERE id = $1)";

const DELETE_SOFTWARE: &str = "DELETE FROM software WHERE id = $1";

impl From<QuerySoftwareDbResp> for Software {
    fn from((id, name, release_id): QuerySoftwareDbResp) -> Self {
        Software { id: Some(id), name, release_id }
    }
}

/**
 * DAO for the software table.
 */
pub struct SoftwareDao {}

impl SoftwareDao {
    pub fn new() -> Self {
        SoftwareDao {}
    }
}

impl EntityDao<Software> for SoftwareDao {
    #[instrument(skip(self, connection), fields(result))]
    async fn save(&self, connection: &mut PgConnection, software: Software) -> Result<Software, ApplicationError> {
        let span = tracing::Span::current();
        let id = match software.id {
            Some(id) => {
                let result = sqlx::query(UPDATE_SOFTWARE)
                    .bind(&software.name)
                    .bind(software.release_id)
                    .bind(id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                check_single_row_updated(result.rows_affected(), "Software", id)?;
                id
            }
            None => {
                let next_id: (i64,) = sqlx::query_as(NEXT_SOFTWARE_ID).fetch_one(&mut *connection).instrument(span.clone()).await.map_err(|err| handle_database_error(&err))?;
                sqlx::query(ADD_SOFTWARE)
                    .bind(next_id.0)
                    .bind(&software.name)
                    .bind(software.release_id)
                    .execute(&mut *connection)
                    .instrument(span.clone())
                    .await
                    .map_err(|err| handle_database_error(&err))?;
                next_id.0
            }
        };
        Ok(Software { id: Some(id), ..software })
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<Option<Software>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QuerySoftwareDbResp> = sqlx::query_as(QUERY_SOFTWARE).bind(id).fetch_optional(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(result.map(Software::from))
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn find_all(&self, connection: &mut PgConnection) -> Result<Vec<Software>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QuerySoftwareDbResp> = sqlx::query_as(QUERY_SOFTWARE_LIST).fetch_all(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(results.into_iter().map(Software::from).collect())
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn exists_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<bool, ApplicationError> {
        let span = tracing::Span::current();
        let exists: (bool,) = sqlx::query_as(EXISTS_SOFTWARE).bind(id).fetch_one(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        Ok(exists.0)
    }

    #[instrument(skip(self, connection), fields(result))]
    async fn delete_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_SOFTWARE).bind(id).execute(connection).instrument(span).await.map_err(|err| handle_database_error(&err))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Software with ID {} not found for deletion", id);
        }
        Ok(())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::dao::{release::ReleaseDao, test_support::init_db};
    use crate::model::models::Release;

    #[sqlx::test]
    async fn test_save_with_release_then_delete_release() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let release_dao = ReleaseDao::new();
        let release = release_dao.save(&mut transaction, Release::new().with_name("1.0")).await.unwrap();
        let software_dao = SoftwareDao::new();
        let saved = software_dao.save(&mut transaction, Software::new().with_name("app").with_release_id(release.id.unwrap())).await.unwrap();
        release_dao.delete_by_id(&mut transaction, release.id.unwrap()).await.unwrap();
        let found = software_dao.find_by_id(&mut transaction, saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("app"));
        assert_eq!(found.release_id, None);
        transaction.rollback().await.unwrap();
    }
}
