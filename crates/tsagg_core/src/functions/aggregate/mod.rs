pub mod first_by;
pub mod grouped;
