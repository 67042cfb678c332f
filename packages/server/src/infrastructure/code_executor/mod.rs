//! CodeExecutor 実装

pub mod http;

pub use http::HttpCodeExecutor;
