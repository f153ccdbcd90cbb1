pub mod attendance_token;
pub mod department;
pub mod role;
pub mod user;
pub mod work_hours;
