#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod criteria;
pub mod error;
pub mod merge;
pub mod response;
pub mod traits;
pub mod transaction;
pub mod types;
