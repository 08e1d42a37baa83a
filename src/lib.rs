pub mod cleanup;
pub mod config;
pub mod duration;
pub mod filename;
pub mod observability;
pub mod selector;
pub mod storage;
pub mod tier;
