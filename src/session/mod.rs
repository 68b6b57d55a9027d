pub mod optimizer;
pub mod opts;
