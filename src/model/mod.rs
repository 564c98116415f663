pub mod attendance;
pub mod date_range;
pub mod employee;
pub mod leave_request;
pub mod role;
pub mod timesheet_blocker;
