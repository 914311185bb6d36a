//! Pure helpers shared by services and the API layer

pub mod date;
pub mod duration;
pub mod file_name;
pub mod money;
pub mod rounding;
