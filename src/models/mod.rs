pub mod enrollment;
pub mod event;
pub mod leave;
pub mod roster;
pub mod shift;
pub mod verdict;
