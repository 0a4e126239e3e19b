pub mod controller;
pub mod motors;
