pub mod admission;
pub mod assistant;
pub mod payments;
