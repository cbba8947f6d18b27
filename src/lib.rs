#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod datamodel;
pub mod http;
pub mod services;
pub mod storage;
pub mod tasks;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
