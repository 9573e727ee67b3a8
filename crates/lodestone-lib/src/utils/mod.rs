pub mod java;
pub mod os_version;

pub use java::{JavaLocator, SystemJava};
pub use os_version::{OsVersionProbe, SystemProbe};
