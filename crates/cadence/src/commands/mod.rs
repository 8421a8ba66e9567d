pub mod config;
pub mod init;
pub mod inject;
pub mod playlist;
pub mod serve;
