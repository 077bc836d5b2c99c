use actix_web::HttpRequest;

use crate::{
    api::security::JwtSecurityService,
    model::apperror::ApplicationError,
    service::{ConsumptionService, MeasureService, MethodService, ReleaseService, SoftwareService},
};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * Application name used in the notification headers.
     */
    pub app_name: String,
    /**
     * The JWT security service. The api is open when missing.
     */
    pub jwt_service: Option<JwtSecurityService>,
    pub consumption_service: ConsumptionService,
    pub measure_service: MeasureService,
    pub method_service: MethodService,
    pub release_service: ReleaseService,
    pub software_service: SoftwareService,
}

impl AppState {
    /**
     * Creates a new instance of `AppState`.
     *
     * # Arguments
     * `app_name`: Application name used in the notification headers.
     * `jwt_service`: The JWT security service, if the api is protected.
     * The remaining arguments are the services of each entity.
     */
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        app_name: String,
        jwt_service: Option<JwtSecurityService>,
        consumption_service: ConsumptionService,
        measure_service: MeasureService,
        method_service: MethodService,
        release_service: ReleaseService,
        software_service: SoftwareService,
    ) -> Self {
        AppState { app_name, jwt_service, consumption_service, measure_service, method_service, release_service, software_service }
    }

    /**
     * Validates the bearer token of the request when security is configured.
     */
    pub fn authorize(&self, http_request: &HttpRequest) -> Result<(), ApplicationError> {
        match &self.jwt_service {
            Some(jwt_service) => jwt_service.validate(http_request),
            None => Ok(()),
        }
    }
}
