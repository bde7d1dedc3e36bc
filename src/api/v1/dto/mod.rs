pub mod me;
pub mod tasks;
