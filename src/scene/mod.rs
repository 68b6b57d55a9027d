pub mod arena;
pub mod dsl;
pub mod file;
pub mod model;
