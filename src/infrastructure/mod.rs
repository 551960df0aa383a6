//! Infrastructure layer - store implementations and logging

pub mod cache;
pub mod logging;
