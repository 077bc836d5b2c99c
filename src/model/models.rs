use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Common behaviour of the persisted entities.
 *
 * Equality of entities is identity based: two entities are equal only when both carry the same
 * persisted id. Transient entities are never equal to anything.
 */
pub trait Entity: Sized {
    /**
     * Name used in validation errors and notification headers.
     */
    const ENTITY_NAME: &'static str;
    /**
     * Path segment of the resource under `/api`.
     */
    const RESOURCE: &'static str;

    /**
     * The persisted id, `None` while transient.
     */
    fn id(&self) -> Option<i64>;

    /**
     * Overwrites every field that is present in `patch`. Relationships are left untouched.
     */
    fn merge(&mut self, patch: Self);

    /**
     * Whether the entity passes the named list filter. Unknown filters keep every entity.
     */
    fn matches_filter(&self, _filter: &str) -> bool {
        true
    }

    /**
     * Checks rules spanning several fields before the entity is stored.
     */
    fn validate(&self) -> Result<(), ApplicationError> {
        Ok(())
    }
}

/**
 * List filter selecting methods without a paired method.
 */
pub const METHOD_IS_NULL_FILTER: &str = "method-is-null";

/**
 * Compares two optional ids using identity semantics.
 */
fn same_identity(left: Option<i64>, right: Option<i64>) -> bool {
    matches!((left, right), (Some(left), Some(right)) if left == right)
}

/**
 * Scope of a consumption measurement.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "APP")]
    App,
    #[serde(rename = "ALL")]
    All,
}

impl Scope {
    /**
     * Name stored in the database and used on the wire.
     */
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::App => "APP",
            Scope::All => "ALL",
        }
    }
}

impl FromStr for Scope {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "APP" => Ok(Scope::App),
            "ALL" => Ok(Scope::All),
            _ => Err(ApplicationError::new(ErrorType::Application, format!("Unknown scope {value}"))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/**
 * How a consumption is monitored.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitoringType {
    #[serde(rename = "EVOLUTION")]
    Evolution,
    #[serde(rename = "RUNTIME")]
    Runtime,
}

impl MonitoringType {
    /**
     * Name stored in the database and used on the wire.
     */
    pub fn as_str(self) -> &'static str {
        match self {
            MonitoringType::Evolution => "EVOLUTION",
            MonitoringType::Runtime => "RUNTIME",
        }
    }
}

impl FromStr for MonitoringType {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "EVOLUTION" => Ok(MonitoringType::Evolution),
            "RUNTIME" => Ok(MonitoringType::Runtime),
            _ => Err(ApplicationError::new(ErrorType::Application, format!("Unknown monitoring type {value}"))),
        }
    }
}

impl fmt::Display for MonitoringType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/**
 * A consumption measurement.
 */
#[derive(Debug, Clone, Default)]
pub struct Consumption {
    pub id: Option<i64>,
    pub value: Option<i64>,
    pub scope: Option<Scope>,
    pub monitoring_type: Option<MonitoringType>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Consumption {
    pub fn new() -> Self {
        Consumption::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_monitoring_type(mut self, monitoring_type: MonitoringType) -> Self {
        self.monitoring_type = Some(monitoring_type);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl Entity for Consumption {
    const ENTITY_NAME: &'static str = "consumptionDbConsumption";
    const RESOURCE: &'static str = "consumptions";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn merge(&mut self, patch: Self) {
        if patch.value.is_some() {
            self.value = patch.value;
        }
        if patch.scope.is_some() {
            self.scope = patch.scope;
        }
        if patch.monitoring_type.is_some() {
            self.monitoring_type = patch.monitoring_type;
        }
        if patch.timestamp.is_some() {
            self.timestamp = patch.timestamp;
        }
    }
}

impl PartialEq for Consumption {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id, other.id)
    }
}

/**
 * A measure taken for a consumption.
 */
#[derive(Debug, Clone, Default)]
pub struct Measure {
    pub id: Option<i64>,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub consumption_id: Option<i64>,
}

impl Measure {
    pub fn new() -> Self {
        Measure::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_start_timestamp(mut self, start_timestamp: DateTime<Utc>) -> Self {
        self.start_timestamp = Some(start_timestamp);
        self
    }

    pub fn with_consumption_id(mut self, consumption_id: i64) -> Self {
        self.consumption_id = Some(consumption_id);
        self
    }
}

impl Entity for Measure {
    const ENTITY_NAME: &'static str = "consumptionDbMeasure";
    const RESOURCE: &'static str = "measures";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn merge(&mut self, patch: Self) {
        if patch.start_timestamp.is_some() {
            self.start_timestamp = patch.start_timestamp;
        }
    }
}

impl PartialEq for Measure {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id, other.id)
    }
}

/**
 * A method of a consumption. `method_id` refers to the paired method.
 */
#[derive(Debug, Clone, Default)]
pub struct Method {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub method_id: Option<i64>,
    pub consumption_id: Option<i64>,
}

impl Method {
    pub fn new() -> Self {
        Method::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_method_id(mut self, method_id: i64) -> Self {
        self.method_id = Some(method_id);
        self
    }

    pub fn with_consumption_id(mut self, consumption_id: i64) -> Self {
        self.consumption_id = Some(consumption_id);
        self
    }
}

impl Entity for Method {
    const ENTITY_NAME: &'static str = "consumptionDbMethod";
    const RESOURCE: &'static str = "methods";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn merge(&mut self, patch: Self) {
        if patch.name.is_some() {
            self.name = patch.name;
        }
    }

    fn matches_filter(&self, filter: &str) -> bool {
        match filter {
            METHOD_IS_NULL_FILTER => self.method_id.is_none(),
            _ => true,
        }
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.id.is_some() && self.id == self.method_id {
            return Err(ApplicationError::bad_request(Self::ENTITY_NAME, "A method cannot be paired with itself", "pairself"));
        }
        Ok(())
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id, other.id)
    }
}

/**
 * A release of the measured software.
 *
 * `method_ids` is `None` when the association was not fetched. Saving a release with `None`
 * leaves the stored association untouched.
 */
#[derive(Debug, Clone, Default)]
pub struct Release {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub method_ids: Option<Vec<i64>>,
}

impl Release {
    pub fn new() -> Self {
        Release::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_method_ids(mut self, method_ids: Vec<i64>) -> Self {
        self.method_ids = Some(method_ids);
        self
    }
}

impl Entity for Release {
    const ENTITY_NAME: &'static str = "consumptionDbRelease";
    const RESOURCE: &'static str = "releases";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn merge(&mut self, patch: Self) {
        if patch.name.is_some() {
            self.name = patch.name;
        }
        if patch.date.is_some() {
            self.date = patch.date;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
    }
}

impl PartialEq for Release {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id, other.id)
    }
}

/**
 * A piece of software shipped in a release.
 */
#[derive(Debug, Clone, Default)]
pub struct Software {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub release_id: Option<i64>,
}

impl Software {
    pub fn new() -> Self {
        Software::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_release_id(mut self, release_id: i64) -> Self {
        self.release_id = Some(release_id);
        self
    }
}

impl Entity for Software {
    const ENTITY_NAME: &'static str = "consumptionDbSoftware";
    const RESOURCE: &'static str = "software";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn merge(&mut self, patch: Self) {
        if patch.name.is_some() {
            self.name = patch.name;
        }
    }
}

impl PartialEq for Software {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id, other.id)
    }
}

/**
 * Optional list filters understood by the resources.
 */
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /**
     * Named predicate, e.g. `method-is-null`.
     */
    pub filter: Option<String>,
    /**
     * Whether many-to-many collections should be fetched.
     */
    pub eager_load: bool,
}
