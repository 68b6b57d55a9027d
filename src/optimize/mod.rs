pub mod copier;
pub mod disjoint;
pub mod reducer;
