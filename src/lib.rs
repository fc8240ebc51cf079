pub mod alice;
pub mod api;
pub mod boot_script;
pub mod cors;
pub mod credential;
pub mod error;
pub mod json_api;
pub mod settings;
