pub mod constants;
pub mod engine;
pub mod maze;
pub mod pathfinding;
pub mod rng;
pub mod score_store;
pub mod types;
