//! 설정 모듈.

pub mod env;
pub mod logging;

pub use env::*;
