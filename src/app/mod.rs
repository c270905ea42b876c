pub mod blackboard;
pub mod dto;
pub mod engine;
pub mod knowledge;
pub mod strategy;
