pub mod attendance;
pub mod department;
pub mod user;
pub mod work_hours;
