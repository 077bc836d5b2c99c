use std::fmt;

/**
 * Represents the type of error that can occur within the application.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorType {
    Initialization,
    JwtAuthorization,
    Validation,
    NotFound,
    ConstraintViolation,
    DatabaseError,
    Application,
}

/**
 * Represents an error that occurs within the application.
 */
#[derive(Debug, Clone)]
pub struct ApplicationError {
    /**
     * Error type.
     */
    pub error_type: ErrorType,
    /**
     * Error message describing problem.
     */
    pub message: String,
    /**
     * Name of the entity the error concerns, if any.
     */
    pub entity_name: Option<String>,
    /**
     * Machine readable reason, e.g. `idexists`.
     */
    pub error_key: Option<String>,
}

impl ApplicationError {
    /**
     * Creates a new ApplicationError.
     *
     * #Arguments
     * `error_type`: The type of error.
     * `message`: A description of the error.
     */
    pub fn new(error_type: ErrorType, message: String) -> Self {
        ApplicationError { error_type, message, entity_name: None, error_key: None }
    }

    /**
     * Creates a validation error carrying the entity name and a reason code.
     *
     * #Arguments
     * `entity_name`: Name of the entity that failed validation.
     * `message`: A description of the error.
     * `error_key`: The reason code returned to the client.
     */
    pub fn bad_request(entity_name: &str, message: &str, error_key: &str) -> Self {
        ApplicationError { error_type: ErrorType::Validation, message: message.to_string(), entity_name: Some(entity_name.to_string()), error_key: Some(error_key.to_string()) }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_key {
            Some(error_key) => write!(f, "{} ({error_key})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
