pub mod emit;
pub mod naming;
pub mod ordering;
pub mod planner;
pub mod trace;
