pub mod change_log;
pub mod cost_targets;
pub mod departments;
pub mod users;

pub mod prelude {
    pub use super::change_log::Entity as ChangeLog;
    pub use super::cost_targets::Entity as CostTargets;
    pub use super::departments::Entity as Departments;
    pub use super::users::Entity as Users;
}
