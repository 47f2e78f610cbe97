//! Request handlers.

pub mod intercept;
