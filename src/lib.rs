pub mod analysis;
pub mod item;
pub mod ladder;
pub mod schedule;
pub mod session;
