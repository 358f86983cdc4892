pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    if let Err(error) = try_run() {
        eprintln!("failed to launch application: {error}");
    }
}

fn try_run() -> Result<(), Box<dyn std::error::Error>> {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let handle = app.handle();

            crate::utils::logger::init_logging(&handle)
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

            let mut data_dir = handle
                .path()
                .app_data_dir()
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

            std::fs::create_dir_all(&data_dir)?;
            data_dir.push("salespulse.sqlite");

            let pool = crate::db::DbPool::new(&data_dir)
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

            let state = crate::commands::AppState::new(pool)
                .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;
            app.manage(state);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            crate::commands::auth::auth_login,
            crate::commands::auth::auth_register,
            crate::commands::auth::auth_logout,
            crate::commands::auth::session_open_view,
            crate::commands::auth::session_current,
            crate::commands::auth::session_take_redirect,
            crate::commands::view::view_register,
            crate::commands::view::view_activate,
            crate::commands::view::view_snapshot,
            crate::commands::dashboard::dashboard_open,
            crate::commands::dashboard::dashboard_refresh,
            crate::commands::dashboard::dashboard_current,
            crate::commands::dashboard::dashboard_close,
            crate::commands::dashboard::dashboard_download_report,
            crate::commands::products::products_load,
            crate::commands::products::products_add,
            crate::commands::products::products_delete,
            crate::commands::users::users_load,
            crate::commands::users::users_add,
            crate::commands::users::users_delete,
            crate::commands::logs::logs_load,
            crate::commands::logs::logs_start_keepalive,
            crate::commands::logs::logs_stop_keepalive,
            crate::commands::submission::submission_draft_update,
            crate::commands::submission::submission_submit,
            crate::commands::submission::submission_check_grammar,
            crate::commands::submission::submission_apply_suggestion,
            crate::commands::submission::assist_ask,
            crate::commands::settings::settings_get,
            crate::commands::settings::settings_update,
        ])
        .run(tauri::generate_context!())?;

    Ok(())
}
