pub const MAX_ASSIGNMENT_TITLE_LENGTH: usize = 200;
pub const MAX_TASKS: usize = 20;
pub const MAX_TASK_TITLE_LENGTH: usize = 1000;
pub const MAX_TASK_REMARKS_LENGTH: usize = 1000;
pub const MAX_LINKS_PER_TASK: usize = 5;
pub const MAX_LINK_LENGTH: usize = 200;
pub const MAX_SOLUTION_LENGTH: usize = 2000;

/// Days until the deadline when an assignment is posted without one.
pub const DEFAULT_SUBMISSION_DAYS: i64 = 30;
