pub mod activity_logs;
pub mod app_users;
pub mod plan_records;
