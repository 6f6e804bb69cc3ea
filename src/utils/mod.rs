//! 유틸리티 모듈.

pub mod rand;

pub use rand::{gen_rand_str, is_valid_secret_token};
