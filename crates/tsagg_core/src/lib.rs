pub mod arrays;
pub mod buffer;
pub mod config;
pub mod functions;
