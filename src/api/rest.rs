use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{Consumption, ListFilter, Measure, Method, MonitoringType, Release, Scope, Software},
};

/***************** Relationship models *********************/

/**
 * Reference to a related entity, serialized as `{"id": n}`.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityReference {
    pub id: i64,
}

impl EntityReference {
    fn from_id(id: Option<i64>) -> Option<Self> {
        id.map(|id| EntityReference { id })
    }

    fn to_id(reference: Option<EntityReference>) -> Option<i64> {
        reference.map(|reference| reference.id)
    }
}

/***************** Consumption models *********************/

/**
 * Consumption as sent and returned by the api.
 */
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionBody {
    pub id: Option<i64>,
    pub value: Option<i64>,
    pub scope: Option<Scope>,
    pub monitoring_type: Option<MonitoringType>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<ConsumptionBody> for Consumption {
    fn from(body: ConsumptionBody) -> Self {
        Consumption { id: body.id, value: body.value, scope: body.scope, monitoring_type: body.monitoring_type, timestamp: body.timestamp }
    }
}

impl From<Consumption> for ConsumptionBody {
    fn from(consumption: Consumption) -> Self {
        ConsumptionBody { id: consumption.id, value: consumption.value, scope: consumption.scope, monitoring_type: consumption.monitoring_type, timestamp: consumption.timestamp }
    }
}

/***************** Measure models *********************/

/**
 * Measure as sent and returned by the api.
 */
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureBody {
    pub id: Option<i64>,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub consumption: Option<EntityReference>,
}

impl From<MeasureBody> for Measure {
    fn from(body: MeasureBody) -> Self {
        Measure { id: body.id, start_timestamp: body.start_timestamp, consumption_id: EntityReference::to_id(body.consumption) }
    }
}

impl From<Measure> for MeasureBody {
    fn from(measure: Measure) -> Self {
        MeasureBody { id: measure.id, start_timestamp: measure.start_timestamp, consumption: EntityReference::from_id(measure.consumption_id) }
    }
}

/***************** Method models *********************/

/**
 * Method as sent and returned by the api. `method` is the paired method.
 */
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodBody {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub method: Option<EntityReference>,
    pub consumption: Option<EntityReference>,
}

impl From<MethodBody> for Method {
    fn from(body: MethodBody) -> Self {
        Method { id: body.id, name: body.name, method_id: EntityReference::to_id(body.method), consumption_id: EntityReference::to_id(body.consumption) }
    }
}

impl From<Method> for MethodBody {
    fn from(method: Method) -> Self {
        MethodBody { id: method.id, name: method.name, method: EntityReference::from_id(method.method_id), consumption: EntityReference::from_id(method.consumption_id) }
    }
}

/***************** Release models *********************/

/**
 * Release as sent and returned by the api.
 *
 * `methods` is only serialized when the association was fetched.
 */
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseBody {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<EntityReference>>,
}

impl ReleaseBody {
    /**
     * Converts a full replacement. A missing `methods` array clears the association.
     */
    pub fn into_replacement(self) -> Release {
        let mut release = Release::from(self);
        if release.method_ids.is_none() {
            release.method_ids = Some(vec![]);
        }
        release
    }
}

impl From<ReleaseBody> for Release {
    fn from(body: ReleaseBody) -> Self {
        Release {
            id: body.id,
            name: body.name,
            date: body.date,
            description: body.description,
            method_ids: body.methods.map(|methods| methods.into_iter().map(|method| method.id).collect()),
        }
    }
}

impl From<Release> for ReleaseBody {
    fn from(release: Release) -> Self {
        ReleaseBody {
            id: release.id,
            name: release.name,
            date: release.date,
            description: release.description,
            methods: release.method_ids.map(|ids| ids.into_iter().map(|id| EntityReference { id }).collect()),
        }
    }
}

/***************** Software models *********************/

/**
 * Software as sent and returned by the api.
 */
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareBody {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub release: Option<EntityReference>,
}

impl From<SoftwareBody> for Software {
    fn from(body: SoftwareBody) -> Self {
        Software { id: body.id, name: body.name, release_id: EntityReference::to_id(body.release) }
    }
}

impl From<Software> for SoftwareBody {
    fn from(software: Software) -> Self {
        SoftwareBody { id: software.id, name: software.name, release: EntityReference::from_id(software.release_id) }
    }
}

/***************** List models *********************/

/**
 * Query parameters of the list endpoints.
 */
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /**
     * Named filter, e.g. `method-is-null`.
     */
    pub filter: Option<String>,
    /**
     * Whether to fetch many-to-many collections. Defaults to true.
     */
    pub eagerload: Option<bool>,
}

impl From<ListQuery> for ListFilter {
    fn from(query: ListQuery) -> Self {
        ListFilter { filter: query.filter, eager_load: query.eagerload.unwrap_or(true) }
    }
}

/***************** Notification headers *********************/

/**
 * Change reported in the alert header.
 */
#[derive(Debug, Clone, Copy)]
pub enum EntityAction {
    Created,
    Updated,
    Deleted,
}

impl EntityAction {
    fn as_str(self) -> &'static str {
        match self {
            EntityAction::Created => "created",
            EntityAction::Updated => "updated",
            EntityAction::Deleted => "deleted",
        }
    }
}

/**
 * Adds the `X-{app}-alert` and `X-{app}-params` headers to a response.
 *
 * # Arguments
 * `response`: The response being built.
 * `app_name`: The configured application name.
 * `entity_name`: Name of the changed entity.
 * `action`: The change.
 * `id`: Id of the changed entity.
 */
pub fn add_alert_headers<'a>(response: &'a mut HttpResponseBuilder, app_name: &str, entity_name: &str, action: EntityAction, id: i64) -> &'a mut HttpResponseBuilder {
    response
        .insert_header((format!("X-{app_name}-alert"), format!("{app_name}.{entity_name}.{}", action.as_str())))
        .insert_header((format!("X-{app_name}-params"), id.to_string()))
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_key: Option<String>,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error. Not found responses have no body.
     */
    fn error_response(&self) -> HttpResponse {
        if self.error_type == ErrorType::NotFound {
            return HttpResponse::NotFound().finish();
        }
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone(), entity_name: self.entity_name.clone(), error_key: self.error_key.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::JwtAuthorization => StatusCode::UNAUTHORIZED,
        ErrorType::Validation | ErrorType::ConstraintViolation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Initialization | ErrorType::DatabaseError | ErrorType::Application => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::JwtAuthorization => 1000,
        ErrorType::Initialization => 1001,
        ErrorType::Validation => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::NotFound => 1004,
        ErrorType::ConstraintViolation => 1005,
        ErrorType::Application => 1006,
    }
}
