pub mod crud;

use crate::dao::{consumption::ConsumptionDao, measure::MeasureDao, method::MethodDao, release::ReleaseDao, software::SoftwareDao};
use crate::model::models::{Consumption, Measure, Method, Release, Software};
use crate::service::crud::CrudService;

pub type ConsumptionService = CrudService<Consumption, ConsumptionDao>;
pub type MeasureService = CrudService<Measure, MeasureDao>;
pub type MethodService = CrudService<Method, MethodDao>;
pub type ReleaseService = CrudService<Release, ReleaseDao>;
pub type SoftwareService = CrudService<Software, SoftwareDao>;
