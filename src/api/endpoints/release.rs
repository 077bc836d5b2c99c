use actix_web::{
    HttpRequest, HttpResponse, delete, get, patch, post, put,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use super::{created_response, deleted_response, get_trace_id, list_response, updated_response};
use crate::{
    api::{
        rest::{ListQuery, ReleaseBody},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{ListFilter, Release},
    },
};

/**
 * Creates a release with the methods listed in the body.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "createRelease", trace_id = get_trace_id(&http_request), result))]
#[post("/api/releases")]
pub async fn create_release(http_request: HttpRequest, request_body: web::Json<ReleaseBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let release = app_state.release_service.create(Release::from(request_body.into_inner())).instrument(span).await?;
    created_response::<_, ReleaseBody>(&app_state.app_name, release)
}

/**
 * Replaces a release. The methods of the body replace the stored methods, a missing array removes them all.
 */
#[instrument(skip(http_request, app_state), fields(service = "updateRelease", trace_id = get_trace_id(&http_request), result))]
#[put("/api/releases/{id}")]
pub async fn update_release(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<ReleaseBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let release = app_state.release_service.update(path.into_inner(), request_body.into_inner().into_replacement()).instrument(span).await?;
    updated_response::<_, ReleaseBody>(&app_state.app_name, release)
}

/**
 * Updates name, date and description when present. Methods are left untouched.
 */
#[instrument(skip(http_request, app_state), fields(service = "partialUpdateRelease", trace_id = get_trace_id(&http_request), result))]
#[patch("/api/releases/{id}")]
pub async fn partial_update_release(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<ReleaseBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let release = app_state.release_service.partial_update(path.into_inner(), Release::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, ReleaseBody>(&app_state.app_name, release)
}

/**
 * Lists every release. Methods are included unless `eagerload=false`.
 */
#[instrument(skip(http_request, app_state), fields(service = "listReleases", trace_id = get_trace_id(&http_request), result))]
#[get("/api/releases")]
pub async fn list_releases(http_request: HttpRequest, query: web::Query<ListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let releases = app_state.release_service.find_all(&ListFilter::from(query.into_inner())).instrument(span).await?;
    Ok(list_response::<_, ReleaseBody>(releases))
}

/**
 * Gets a release with its methods or 404.
 */
#[instrument(skip(http_request, app_state), fields(service = "getRelease", trace_id = get_trace_id(&http_request), result))]
#[get("/api/releases/{id}")]
pub async fn get_release(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let release = app_state.release_service.find_one(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(ReleaseBody::from(release)))
}

#[instrument(skip(http_request, app_state), fields(service = "deleteRelease", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/releases/{id}")]
pub async fn delete_release(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let id = path.into_inner();
    app_state.release_service.delete(id).instrument(span).await?;
    Ok(deleted_response::<Release>(&app_state.app_name, id))
}

#[cfg(test)]
mod test {
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::api::endpoints::{configure, test_support::state_without_database};

    #[actix_web::test]
    async fn test_update_without_id() {
        let app = test::init_service(App::new().app_data(state_without_database(None)).configure(configure)).await;
        let request = test::TestRequest::put().uri("/api/releases/1").set_json(json!({"name": "1.0", "methods": [{"id": 1}]})).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["errorKey"], "idnull");
        assert_eq!(body["entityName"], "consumptionDbRelease");
    }

    #[actix_web::test]
    async fn test_eagerload_must_be_boolean() {
        let app = test::init_service(App::new().app_data(state_without_database(None)).configure(configure)).await;
        let response = test::call_service(&app, test::TestRequest::get().uri("/api/releases?eagerload=maybe").to_request()).await;
        assert_eq!(response.status().as_u16(), 400);
    }
}
