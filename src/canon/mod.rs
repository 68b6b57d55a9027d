pub mod canonicalizer;
pub mod signature;
