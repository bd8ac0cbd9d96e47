#[cfg(feature = "mfapi")]
pub mod mfapi;

#[cfg(feature = "mfapi")]
pub use mfapi::MfapiNavSource;
