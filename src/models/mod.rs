mod admin_user;
mod project;

pub use admin_user::AdminUser;
pub use project::{format_currency, funding_percentage, Campaign, NewProject, Project};
