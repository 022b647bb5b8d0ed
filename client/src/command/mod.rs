pub mod attendance;
pub mod dashboard;
pub mod login;
pub mod marks;
pub mod signup;
pub mod student;
pub mod subject;
