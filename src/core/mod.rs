pub mod classifier;
pub mod controller;
pub mod enroll;
pub mod reconciler;
pub mod roster;
pub mod sync;
