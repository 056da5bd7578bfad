#![forbid(unsafe_code)]

pub mod driver;
pub mod logging;
pub mod presenter;
