pub mod consumption;
pub mod measure;
pub mod method;
pub mod release;
pub mod software;

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Serialize;

use crate::{
    api::rest::{EntityAction, add_alert_headers},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::Entity,
    },
};

/**
 * Registers the endpoints of every resource.
 */
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(consumption::create_consumption)
        .service(consumption::update_consumption)
        .service(consumption::partial_update_consumption)
        .service(consumption::list_consumptions)
        .service(consumption::get_consumption)
        .service(consumption::delete_consumption)
        .service(measure::create_measure)
        .service(measure::update_measure)
        .service(measure::partial_update_measure)
        .service(measure::list_measures)
        .service(measure::get_measure)
        .service(measure::delete_measure)
        .service(method::create_method)
        .service(method::update_method)
        .service(method::partial_update_method)
        .service(method::list_methods)
        .service(method::get_method)
        .service(method::delete_method)
        .service(release::create_release)
        .service(release::update_release)
        .service(release::partial_update_release)
        .service(release::list_releases)
        .service(release::get_release)
        .service(release::delete_release)
        .service(software::create_software)
        .service(software::update_software)
        .service(software::partial_update_software)
        .service(software::list_software)
        .service(software::get_software)
        .service(software::delete_software);
}

/**
 * 201 response with the location of the new entity, the creation alert and the entity as body.
 */
fn created_response<E: Entity, B: Serialize + From<E>>(app_name: &str, entity: E) -> Result<HttpResponse, ApplicationError> {
    let id = persisted_id(&entity)?;
    let mut response = HttpResponse::Created();
    response.insert_header((header::LOCATION, format!("/api/{}/{id}", E::RESOURCE)));
    Ok(add_alert_headers(&mut response, app_name, E::ENTITY_NAME, EntityAction::Created, id).json(B::from(entity)))
}

/**
 * 200 response with the update alert and the entity as body.
 */
fn updated_response<E: Entity, B: Serialize + From<E>>(app_name: &str, entity: E) -> Result<HttpResponse, ApplicationError> {
    let id = persisted_id(&entity)?;
    Ok(add_alert_headers(&mut HttpResponse::Ok(), app_name, E::ENTITY_NAME, EntityAction::Updated, id).json(B::from(entity)))
}

fn deleted_response<E: Entity>(app_name: &str, id: i64) -> HttpResponse {
    add_alert_headers(&mut HttpResponse::NoContent(), app_name, E::ENTITY_NAME, EntityAction::Deleted, id).finish()
}

fn list_response<E, B: Serialize + From<E>>(entities: Vec<E>) -> HttpResponse {
    HttpResponse::Ok().json(entities.into_iter().map(B::from).collect::<Vec<B>>())
}

fn persisted_id<E: Entity>(entity: &E) -> Result<i64, ApplicationError> {
    entity.id().ok_or_else(|| ApplicationError::new(ErrorType::Application, format!("{} was not assigned an id", E::ENTITY_NAME)))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::web;

    use crate::{
        api::{security::JwtSecurityService, state::AppState},
        dao::{consumption::ConsumptionDao, measure::MeasureDao, method::MethodDao, release::ReleaseDao, software::SoftwareDao},
        service::crud::CrudService,
    };

    pub const APP_NAME: &str = "consumptionDb";

    /**
     * State without a database. Requests failing validation never reach the pool.
     */
    pub fn state_without_database(jwt_service: Option<JwtSecurityService>) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            APP_NAME.to_string(),
            jwt_service,
            CrudService::new(ConsumptionDao::new(), None),
            CrudService::new(MeasureDao::new(), None),
            CrudService::new(MethodDao::new(), None),
            CrudService::new(ReleaseDao::new(), None),
            CrudService::new(SoftwareDao::new(), None),
        ))
    }
}

#[cfg(test)]
mod test {
    use actix_web::{App, test::TestRequest};

    use super::*;
    use crate::api::rest::MethodBody;
    use crate::api::security::JwtSecurityService;
    use crate::model::models::Method;

    #[actix_web::test]
    async fn test_get_trace_id_exists() {
        let request = TestRequest::default().insert_header(("X-Trace-ID", "test")).to_http_request();
        assert_eq!(get_trace_id(&request), "test");
    }

    #[actix_web::test]
    async fn test_get_trace_id_not_exists() {
        let request = TestRequest::default().to_http_request();
        assert!(!get_trace_id(&request).is_empty());
    }

    #[test]
    fn test_created_response_headers() {
        let response = created_response::<_, MethodBody>("consumptionDb", Method::new().with_id(4).with_name("a")).unwrap();
        assert_eq!(response.status().as_u16(), 201);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/api/methods/4");
        assert_eq!(response.headers().get("X-consumptionDb-alert").unwrap(), "consumptionDb.consumptionDbMethod.created");
        assert_eq!(response.headers().get("X-consumptionDb-params").unwrap(), "4");
    }

    #[test]
    fn test_transient_entity_cannot_be_returned() {
        assert!(updated_response::<_, MethodBody>("consumptionDb", Method::new()).is_err());
    }

    #[test]
    fn test_deleted_response() {
        let response = deleted_response::<Method>("consumptionDb", 9);
        assert_eq!(response.status().as_u16(), 204);
        assert_eq!(response.headers().get("X-consumptionDb-alert").unwrap(), "consumptionDb.consumptionDbMethod.deleted");
    }

    #[actix_web::test]
    async fn test_unauthorized_without_token() {
        let jwt_service = JwtSecurityService::new("secret", "HS256").unwrap();
        let app = actix_web::test::init_service(App::new().app_data(test_support::state_without_database(Some(jwt_service))).configure(configure)).await;
        for uri in ["/api/consumptions", "/api/measures", "/api/methods", "/api/releases", "/api/software"] {
            let response = actix_web::test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(response.status().as_u16(), 401, "{uri}");
        }
    }

    #[actix_web::test]
    async fn test_list_without_database_is_server_error() {
        let app = actix_web::test::init_service(App::new().app_data(test_support::state_without_database(None)).configure(configure)).await;
        let response = actix_web::test::call_service(&app, TestRequest::get().uri("/api/methods?filter=method-is-null").to_request()).await;
        assert_eq!(response.status().as_u16(), 500);
    }
}
