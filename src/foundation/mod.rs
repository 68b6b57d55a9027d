pub mod core;
pub mod error;
pub mod hash;
pub mod ids;
pub mod sort;
