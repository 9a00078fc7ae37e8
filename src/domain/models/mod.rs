pub mod file;
pub mod image;
