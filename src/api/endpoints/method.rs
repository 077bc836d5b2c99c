use actix_web::{
    HttpRequest, HttpResponse, delete, get, patch, post, put,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use super::{created_response, deleted_response, get_trace_id, list_response, updated_response};
use crate::{
    api::{
        rest::{ListQuery, MethodBody},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{ListFilter, Method},
    },
};

/**
 * Creates a method.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "createMethod", trace_id = get_trace_id(&http_request), result))]
#[post("/api/methods")]
pub async fn create_method(http_request: HttpRequest, request_body: web::Json<MethodBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let method = app_state.method_service.create(Method::from(request_body.into_inner())).instrument(span).await?;
    created_response::<_, MethodBody>(&app_state.app_name, method)
}

/**
 * Replaces a method. Changing the paired method also updates the old and new partners.
 */
#[instrument(skip(http_request, app_state), fields(service = "updateMethod", trace_id = get_trace_id(&http_request), result))]
#[put("/api/methods/{id}")]
pub async fn update_method(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<MethodBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let method = app_state.method_service.update(path.into_inner(), Method::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, MethodBody>(&app_state.app_name, method)
}

/**
 * Updates the fields present in the body. Accepts `application/json` and `application/merge-patch+json`.
 */
#[instrument(skip(http_request, app_state), fields(service = "partialUpdateMethod", trace_id = get_trace_id(&http_request), result))]
#[patch("/api/methods/{id}")]
pub async fn partial_update_method(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<MethodBody>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let method = app_state.method_service.partial_update(path.into_inner(), Method::from(request_body.into_inner())).instrument(span).await?;
    updated_response::<_, MethodBody>(&app_state.app_name, method)
}

/**
 * Lists every method. `filter=method-is-null` keeps only methods without a paired method.
 */
#[instrument(skip(http_request, app_state), fields(service = "listMethods", trace_id = get_trace_id(&http_request), result))]
#[get("/api/methods")]
pub async fn list_methods(http_request: HttpRequest, query: web::Query<ListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let methods = app_state.method_service.find_all(&ListFilter::from(query.into_inner())).instrument(span).await?;
    Ok(list_response::<_, MethodBody>(methods))
}

/**
 * Gets a method or 404.
 */
#[instrument(skip(http_request, app_state), fields(service = "getMethod", trace_id = get_trace_id(&http_request), result))]
#[get("/api/methods/{id}")]
pub async fn get_method(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let method = app_state.method_service.find_one(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(MethodBody::from(method)))
}

/**
 * Deletes a method. Its partner and releases no longer refer to it.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteMethod", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/methods/{id}")]
pub async fn delete_method(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.authorize(&http_request)?;
    let id = path.into_inner();
    app_state.method_service.delete(id).instrument(span).await?;
    Ok(deleted_response::<Method>(&app_state.app_name, id))
}
