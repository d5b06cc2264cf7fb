pub mod ask;
pub mod tools;
