pub mod assignment_service;

pub use assignment_service::{AssignmentService, CreatedAssignment, require_staff, require_teacher};
