use actix_web::{
    HttpRequest, HttpResponse, delete, get, patch, post, put,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use super::{created_response, deleted_response, get_trace_id, list_response, updated_response};
use crate::{
    api::{
        rest::{SoftwareBody, ListQuery},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{Software, ListFilter},
    },
};

/**
 * Creates a software, optionally in a release.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "createSoftware", trace_id = get_trace_id(&http_request), result))]
#[post("/api/software")]
pub async fn create_software(http_request: HttpRequest, request_body: web::Json<SoftwareBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let software = app_state.software_service.create(Software::from(request_body.into_inner())).instrument(span).await?;
    created_response::<_, SoftwareBody>(&app_state.app_name, software)
}

/**
 * Replaces a software.
 */
#[instrument(skip(http_request, app_state), fields(service = "updateSoftware", trace_id = get_trace_id(&http_request), result))]
#[put("/api/software/{id}")]
pub async fn update_software(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<SoftwareBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let software = app_state.software_service.update(path.into_inner(), Software::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, SoftwareBody>(&app_state.app_name, software)
}

/**
 * Updates the fields present in the body. Accepts `application/json` and `application/merge-patch+json`.
 */
#[instrument(skip(http_request, app_state), fields(service = "partialUpdateSoftware", trace_id = get_trace_id(&http_request), result))]
#[patch("/api/software/{id}")]
pub async fn partial_update_software(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<SoftwareBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let software = app_state.software_service.partial_update(path.into_inner(), Software::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, SoftwareBody>(&app_state.app_name, software)
}

/**
 * Lists every software.
 */
#[instrument(skip(http_request, app_state), fields(service = "listSoftware", trace_id = get_trace_id(&http_request), result))]
#[get("/api/software")]
pub async fn list_software(http_request: HttpRequest, query: web::Query<ListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let software_list = app_state.software_service.find_all(&ListFilter::from(query.into_inner())).instrument(span).await?;
    Ok(list_response::<_, SoftwareBody>(software_list))
}

/**
 * Gets a software or 404.
 */
#[instrument(skip(http_request, app_state), fields(service = "getSoftware", trace_id = get_trace_id(&http_request), result))]
#[get("/api/software/{id}")]
pub async fn get_software(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let software = app_state.software_service.find_one(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(SoftwareBody::from(software)))
}

/**
 * Deletes a software.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteSoftware", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/software/{id}")]
pub async fn delete_software(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let id = path.into_inner();
    app_state.software_service.delete(id).instrument(span).await?;
    Ok(deleted_response::<Software>(&app_state.app_name, id))
}


#[cfg(test)]
mod test {
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::api::endpoints::{configure, test_support::state_without_database};

    #[actix_web::test]
    async fn test_create_with_id() {
        let app = test::init_service(App::new().app_data(state_without_database(None)).configure(configure)).await;
        let request = test::TestRequest::post().uri("/api/software").set_json(json!({"id": 1, "name": "app", "release": {"id": 2}})).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["errorKey"], "idexists");
        assert_eq!(body["entityName"], "consumptionDbSoftware");
    }
}
