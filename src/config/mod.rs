pub mod database;
pub mod hashids;
pub mod jwt;
pub mod reaction;
