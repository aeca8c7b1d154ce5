pub mod annotate;
pub mod criteria;
pub mod init;
pub mod summary;
pub mod validate;
