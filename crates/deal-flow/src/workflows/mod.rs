pub mod analysis;
pub mod feasibility;
