//! Services module
//!
//! Business logic services that coordinate between routes and the repository.

pub mod answers;
pub mod institutions;
pub mod monitorings;

pub use answers::AnswerService;
pub use institutions::InstitutionService;
pub use monitorings::MonitoringService;
