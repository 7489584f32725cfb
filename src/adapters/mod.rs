pub mod database;
pub mod email;
