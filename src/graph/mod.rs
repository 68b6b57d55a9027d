pub mod builder;
pub mod node;
