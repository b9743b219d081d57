//! # OTP Configuration Policy
//!
//! Pure, stateless policy functions: threshold validation of proposed OTP
//! configurations and the named preset table.

pub mod presets;
pub mod validator;

pub use presets::{preset, preset_by_name};
pub use validator::{validate_config, ConfigValidator};
