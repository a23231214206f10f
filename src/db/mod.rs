pub mod log;
pub mod migrate;
pub mod pool;
pub mod remote;
pub mod roster;
pub mod state;
