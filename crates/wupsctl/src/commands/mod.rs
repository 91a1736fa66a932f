pub mod init;
pub mod inspect;
pub mod plugin;
pub mod run;
