pub mod cli;
pub mod config;
pub mod cron;
pub mod settings;
pub mod shell;
pub mod statusbar;
pub mod transcript;
pub mod usage;
