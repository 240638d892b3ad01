pub mod assignment;
pub mod limits;
pub mod task;
pub mod user;

pub use assignment::{Assignment, AssignmentRow, NewAssignmentRequest, UpdateAssignmentRequest};
pub use task::{NewTaskRequest, Task, TaskRow, UpdateTaskRequest};
pub use user::{Caller, Role, User, UserRow};
