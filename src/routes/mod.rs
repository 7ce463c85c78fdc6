pub mod assistant;
pub mod feedback;
pub mod health;
pub mod usage;
