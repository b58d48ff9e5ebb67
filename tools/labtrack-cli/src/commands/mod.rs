pub mod calibrate;
pub mod config;
pub mod derive;
pub mod export;
pub mod info;
pub mod init;
pub mod remove;
pub mod select;
pub mod tag;
