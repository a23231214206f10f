pub mod buffer;
pub mod config;
pub mod init;
pub mod log;
pub mod reconcile;
pub mod remote;
pub mod roster;
pub mod run;
pub mod scan;
pub mod sync;
