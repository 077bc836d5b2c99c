use std::marker::PhantomData;

use sqlx::{PgConnection, Pool, Postgres, Transaction};

use crate::{
    dao::EntityDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{Entity, ListFilter},
    },
};

/**
 * Create, read, update and delete operations of one entity type.
 *
 * Identifier checks run before any database access. Every mutating operation runs in a single
 * transaction that is rolled back on error.
 */
pub struct CrudService<E, D> {
    /**
     * The DAO of the entity.
     */
    dao: D,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
    marker: PhantomData<fn() -> E>,
}

impl<E: Entity, D: EntityDao<E>> CrudService<E, D> {
    /**
     * Creates a new instance of `CrudService`.
     *
     * # Arguments
     * `dao`: The DAO of the entity.
     * `connection_pool`: Optional connection pool for database operations.
     */
    pub fn new(dao: D, connection_pool: Option<Pool<Postgres>>) -> Self {
        CrudService { dao, connection_pool, marker: PhantomData }
    }

    /**
     * Persists a new entity.
     *
     * # Returns
     * The entity with its assigned id, or a validation error `idexists` if it already has an id.
     */
    pub async fn create(&self, entity: E) -> Result<E, ApplicationError> {
        if entity.id().is_some() {
            return Err(ApplicationError::bad_request(E::ENTITY_NAME, "A new entity cannot already have an ID", "idexists"));
        }
        entity.validate()?;
        let mut transaction = self.begin().await?;
        let result = self.dao.save(&mut transaction, entity).await;
        Self::finish(transaction, result).await
    }

    /**
     * Replaces an existing entity.
     *
     * # Arguments
     * `id`: The id from the request path.
     * `entity`: The replacement, which must carry the same id.
     */
    pub async fn update(&self, id: i64, entity: E) -> Result<E, ApplicationError> {
        Self::validate_ids(id, &entity)?;
        entity.validate()?;
        let mut transaction = self.begin().await?;
        let result = self.update_existing(&mut transaction, id, entity).await;
        Self::finish(transaction, result).await
    }

    /**
     * Overwrites the fields present in `patch` on the stored entity.
     *
     * # Arguments
     * `id`: The id from the request path.
     * `patch`: The fields to change, which must carry the same id.
     */
    pub async fn partial_update(&self, id: i64, patch: E) -> Result<E, ApplicationError> {
        Self::validate_ids(id, &patch)?;
        let mut transaction = self.begin().await?;
        let result = self.merge_existing(&mut transaction, id, patch).await;
        Self::finish(transaction, result).await
    }

    /**
     * Lists every entity.
     *
     * # Arguments
     * `list_filter`: Named filter applied to the fetched entities and whether to fetch collections.
     */
    pub async fn find_all(&self, list_filter: &ListFilter) -> Result<Vec<E>, ApplicationError> {
        let mut connection = self.connection_pool()?.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        let entities = if list_filter.eager_load { self.dao.find_all_with_eager_relationships(&mut connection).await? } else { self.dao.find_all(&mut connection).await? };
        Ok(Self::apply_filter(entities, list_filter.filter.as_deref()))
    }

    /**
     * Finds one entity with its collections.
     *
     * # Returns
     * The entity or a `NotFound` error.
     */
    pub async fn find_one(&self, id: i64) -> Result<E, ApplicationError> {
        let mut connection = self.connection_pool()?.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.dao.find_one_with_eager_relationships(&mut connection, id).await?.ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("{} not found", E::ENTITY_NAME)))
    }

    /**
     * Deletes an entity. Deleting a missing id succeeds.
     */
    pub async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
        let mut transaction = self.begin().await?;
        let result = self.dao.delete_by_id(&mut transaction, id).await;
        Self::finish(transaction, result).await
    }

    async fn update_existing(&self, connection: &mut PgConnection, id: i64, entity: E) -> Result<E, ApplicationError> {
        if !self.dao.exists_by_id(connection, id).await? {
            return Err(ApplicationError::bad_request(E::ENTITY_NAME, "Entity not found", "idnotfound"));
        }
        self.dao.save(connection, entity).await
    }

    async fn merge_existing(&self, connection: &mut PgConnection, id: i64, patch: E) -> Result<E, ApplicationError> {
        if !self.dao.exists_by_id(connection, id).await? {
            return Err(ApplicationError::bad_request(E::ENTITY_NAME, "Entity not found", "idnotfound"));
        }
        let Some(mut existing) = self.dao.find_by_id(connection, id).await? else {
            return Err(ApplicationError::new(ErrorType::NotFound, format!("{} not found", E::ENTITY_NAME)));
        };
        existing.merge(patch);
        self.dao.save(connection, existing).await
    }

    /**
     * Checks the body id against the path id.
     */
    fn validate_ids(id: i64, entity: &E) -> Result<(), ApplicationError> {
        let Some(entity_id) = entity.id() else {
            return Err(ApplicationError::bad_request(E::ENTITY_NAME, "Invalid id", "idnull"));
        };
        if entity_id != id {
            return Err(ApplicationError::bad_request(E::ENTITY_NAME, "Invalid ID", "idinvalid"));
        }
        Ok(())
    }

    fn apply_filter(entities: Vec<E>, filter: Option<&str>) -> Vec<E> {
        match filter {
            Some(filter) => entities.into_iter().filter(|entity| entity.matches_filter(filter)).collect(),
            None => entities,
        }
    }

    fn connection_pool(&self) -> Result<&Pool<Postgres>, ApplicationError> {
        self.connection_pool.as_ref().ok_or_else(|| ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()))
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, ApplicationError> {
        self.connection_pool()?.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))
    }

    /**
     * Commits the transaction when the operation succeeded, otherwise rolls it back.
     */
    async fn finish<T>(transaction: Transaction<'static, Postgres>, result: Result<T, ApplicationError>) -> Result<T, ApplicationError> {
        match result {
            Ok(value) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(value)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dao::{consumption::ConsumptionDao, method::MethodDao, release::ReleaseDao};
    use crate::model::models::{Consumption, METHOD_IS_NULL_FILTER, Method, Release};

    #[actix_web::test]
    async fn test_create_with_id_is_rejected() {
        let service = CrudService::new(ConsumptionDao::new(), None);
        let error = service.create(Consumption::new().with_id(1).with_value(1)).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.error_key.as_deref(), Some("idexists"));
        assert_eq!(error.entity_name.as_deref(), Some("consumptionDbConsumption"));
    }

    #[actix_web::test]
    async fn test_update_without_id_is_rejected() {
        let service = CrudService::new(MethodDao::new(), None);
        let error = service.update(1, Method::new().with_name("a")).await.unwrap_err();
        assert_eq!(error.error_key.as_deref(), Some("idnull"));
        let error = service.partial_update(1, Method::new().with_name("a")).await.unwrap_err();
        assert_eq!(error.error_key.as_deref(), Some("idnull"));
    }

    #[actix_web::test]
    async fn test_update_with_other_id_is_rejected() {
        let service = CrudService::new(ReleaseDao::new(), None);
        let error = service.update(1, Release::new().with_id(2)).await.unwrap_err();
        assert_eq!(error.error_key.as_deref(), Some("idinvalid"));
        let error = service.partial_update(1, Release::new().with_id(2)).await.unwrap_err();
        assert_eq!(error.error_key.as_deref(), Some("idinvalid"));
    }

    #[actix_web::test]
    async fn test_valid_request_needs_database() {
        let service = CrudService::new(ConsumptionDao::new(), None);
        let error = service.create(Consumption::new().with_value(1)).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::DatabaseError);
        let error = service.find_all(&ListFilter::default()).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::DatabaseError);
    }

    #[test]
    fn test_method_is_null_filter() {
        let methods = vec![Method::new().with_id(1).with_method_id(2), Method::new().with_id(2).with_method_id(1), Method::new().with_id(3)];
        let filtered = CrudService::<Method, MethodDao>::apply_filter(methods.clone(), Some(METHOD_IS_NULL_FILTER));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, Some(3));
        assert_eq!(CrudService::<Method, MethodDao>::apply_filter(methods, Some("unknown")).len(), 3);
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::dao::{consumption::ConsumptionDao, measure::MeasureDao, method::MethodDao, release::ReleaseDao, test_support::init_db};
    use crate::model::models::{Consumption, METHOD_IS_NULL_FILTER, Measure, Method, MonitoringType, Release, Scope};

    #[sqlx::test]
    async fn test_consumption_lifecycle() {
        let pool = init_db().await;
        let service = CrudService::new(ConsumptionDao::new(), Some(pool));
        let timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let created = service.create(Consumption::new().with_value(1).with_scope(Scope::App).with_monitoring_type(MonitoringType::Evolution).with_timestamp(timestamp)).await.unwrap();
        let id = created.id.unwrap();
        let count = service.find_all(&ListFilter::default()).await.unwrap().len();

        let error = service.create(Consumption::new().with_id(id).with_value(5)).await.unwrap_err();
        assert_eq!(error.error_key.as_deref(), Some("idexists"));
        assert_eq!(service.find_all(&ListFilter::default()).await.unwrap().len(), count);

        let patched = service.partial_update(id, Consumption::new().with_id(id).with_value(2)).await.unwrap();
        assert_eq!(patched.value, Some(2));
        let found = service.find_one(id).await.unwrap();
        assert_eq!(found.value, Some(2));
        assert_eq!(found.scope, Some(Scope::App));
        assert_eq!(found.monitoring_type, Some(MonitoringType::Evolution));
        assert_eq!(found.timestamp, Some(timestamp));

        service.delete(id).await.unwrap();
        assert_eq!(service.find_all(&ListFilter::default()).await.unwrap().len(), count - 1);
        assert_eq!(service.find_one(id).await.unwrap_err().error_type, ErrorType::NotFound);
        service.delete(id).await.unwrap();
    }

    #[sqlx::test]
    async fn test_update_missing_release() {
        let pool = init_db().await;
        let service = CrudService::new(ReleaseDao::new(), Some(pool));
        let error = service.update(i64::MAX, Release::new().with_id(i64::MAX).with_name("x")).await.unwrap_err();
        assert_eq!(error.error_key.as_deref(), Some("idnotfound"));
        let error = service.partial_update(i64::MAX, Release::new().with_id(i64::MAX).with_name("x")).await.unwrap_err();
        assert_eq!(error.error_key.as_deref(), Some("idnotfound"));
    }

    #[sqlx::test]
    async fn test_release_patch_keeps_other_fields() {
        let pool = init_db().await;
        let service = CrudService::new(ReleaseDao::new(), Some(pool));
        let date = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let created = service.create(Release::new().with_name("1.0").with_date(date).with_description("first")).await.unwrap();
        let id = created.id.unwrap();
        service.partial_update(id, Release::new().with_id(id).with_name("1.1")).await.unwrap();
        let found = service.find_one(id).await.unwrap();
        assert_eq!(found.name.as_deref(), Some("1.1"));
        assert_eq!(found.date, Some(date));
        assert_eq!(found.description.as_deref(), Some("first"));
        service.delete(id).await.unwrap();
    }

    #[sqlx::test]
    async fn test_timestamps_keep_stored_precision() {
        let pool = init_db().await;
        let timestamp = DateTime::parse_from_rfc3339("2023-11-14T22:13:20.123456789Z").unwrap().with_timezone(&Utc);
        let stored = DateTime::parse_from_rfc3339("2023-11-14T22:13:20.123456Z").unwrap().with_timezone(&Utc);

        let consumption_service = CrudService::new(ConsumptionDao::new(), Some(pool.clone()));
        let created = consumption_service.create(Consumption::new().with_value(1).with_timestamp(timestamp)).await.unwrap();
        assert_eq!(created.timestamp, Some(stored));
        assert_eq!(consumption_service.find_one(created.id.unwrap()).await.unwrap().timestamp, created.timestamp);
        consumption_service.delete(created.id.unwrap()).await.unwrap();

        let measure_service = CrudService::new(MeasureDao::new(), Some(pool.clone()));
        let created = measure_service.create(Measure::new().with_start_timestamp(timestamp)).await.unwrap();
        assert_eq!(measure_service.find_one(created.id.unwrap()).await.unwrap().start_timestamp, Some(stored));
        measure_service.delete(created.id.unwrap()).await.unwrap();

        let release_service = CrudService::new(ReleaseDao::new(), Some(pool));
        let created = release_service.create(Release::new().with_name("2.0").with_date(timestamp)).await.unwrap();
        let id = created.id.unwrap();
        assert_eq!(release_service.find_one(id).await.unwrap().date, created.date);
        let patched = release_service.partial_update(id, Release::new().with_id(id).with_date(timestamp)).await.unwrap();
        assert_eq!(patched.date, Some(stored));
        release_service.delete(id).await.unwrap();
    }

    #[sqlx::test]
    async fn test_release_list_lazy_and_eager() {
        let pool = init_db().await;
        let method_service = CrudService::new(MethodDao::new(), Some(pool.clone()));
        let method1 = method_service.create(Method::new().with_name("a")).await.unwrap().id.unwrap();
        let method2 = method_service.create(Method::new().with_name("b")).await.unwrap().id.unwrap();
        let release_service = CrudService::new(ReleaseDao::new(), Some(pool));
        let id = release_service.create(Release::new().with_name("3.0").with_method_ids(vec![method2, method1])).await.unwrap().id.unwrap();

        let eager = release_service.find_all(&ListFilter { filter: None, eager_load: true }).await.unwrap();
        let release = eager.iter().find(|release| release.id == Some(id)).unwrap();
        let mut expected = vec![method1, method2];
        expected.sort_unstable();
        assert_eq!(release.method_ids, Some(expected));

        let lazy = release_service.find_all(&ListFilter { filter: None, eager_load: false }).await.unwrap();
        let release = lazy.iter().find(|release| release.id == Some(id)).unwrap();
        assert_eq!(release.method_ids, None);
        assert_eq!(release.name.as_deref(), Some("3.0"));

        release_service.delete(id).await.unwrap();
        method_service.delete(method1).await.unwrap();
        method_service.delete(method2).await.unwrap();
    }

    #[sqlx::test]
    async fn test_method_is_null_filter_over_stored_methods() {
        let pool = init_db().await;
        let service = CrudService::new(MethodDao::new(), Some(pool));
        let method_a = service.create(Method::new().with_name("a")).await.unwrap().id.unwrap();
        let method_b = service.create(Method::new().with_name("b").with_method_id(method_a)).await.unwrap().id.unwrap();
        let method_c = service.create(Method::new().with_name("c")).await.unwrap().id.unwrap();

        let unpaired: Vec<i64> = service.find_all(&ListFilter { filter: Some(METHOD_IS_NULL_FILTER.to_string()), eager_load: true }).await.unwrap().into_iter().filter_map(|method| method.id).collect();
        assert!(unpaired.contains(&method_c));
        assert!(!unpaired.contains(&method_a));
        assert!(!unpaired.contains(&method_b));

        let all: Vec<i64> = service.find_all(&ListFilter::default()).await.unwrap().into_iter().filter_map(|method| method.id).collect();
        assert!([method_a, method_b, method_c].iter().all(|id| all.contains(id)));

        for id in [method_a, method_b, method_c] {
            service.delete(id).await.unwrap();
        }
    }
}
