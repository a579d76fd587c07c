pub mod ai;
pub mod entity;
pub mod physics;
pub mod rules;
