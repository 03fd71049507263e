pub mod git_status;
pub mod init;
pub mod session;
pub mod work;
