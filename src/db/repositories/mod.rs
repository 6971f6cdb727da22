pub mod change_log;
pub mod cost_target;
pub mod department;
pub mod user;
