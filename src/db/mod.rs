pub mod admin_users;
pub mod projects;
