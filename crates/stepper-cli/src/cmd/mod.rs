pub mod config;
pub mod init;
pub mod nav;
pub mod report;
pub mod reset;
pub mod save;
pub mod show;
pub mod status;
pub mod steps;
