pub mod attendance;
pub mod balance;
pub mod blocker;
pub mod leave_request;
