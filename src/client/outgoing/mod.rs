pub mod message;

#[cfg(all(feature = "smtp", feature = "runtime-tokio"))]
pub mod smtp;
