pub mod buffer_manager;
pub mod group_array;
