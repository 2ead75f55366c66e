pub mod account;
pub mod api;
pub mod app;
pub mod auth_forms;
pub mod cli;
pub mod config;
pub mod create_task;
pub mod dispatch;
pub mod error;
pub mod my_tasks;
pub mod remote;
pub mod session;
pub mod task;
pub mod task_detail;
pub mod task_list;
pub mod ui;
pub mod user;
