pub mod activity_log_service;
pub mod api_gateway;
pub mod auth_service;
pub mod credential_store;
pub mod dashboard_service;
pub mod product_service;
pub mod session_guard;
pub mod settings_service;
pub mod submission_service;
pub mod user_admin_service;
pub mod view_state;
