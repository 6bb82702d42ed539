//! Build metadata embedded by the build script, used for the CLI version
//! line and the HTTP `User-Agent`.

/// Short git commit hash at build time, or `unknown`.
pub const GIT_HASH: &str = env!("GSTC_GIT_HASH");

/// The build profile (`debug` or `release`).
pub const BUILD_PROFILE: &str = env!("GSTC_BUILD_PROFILE");

/// The crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-readable version, e.g. `"0.1.0 (abc1234, debug)"`.
pub fn version_string() -> String {
    format!("{VERSION} ({GIT_HASH}, {BUILD_PROFILE})")
}

/// `User-Agent` sent with every daemon request, e.g. `"gstc/0.1.0+abc1234"`.
pub fn user_agent() -> String {
    format!("gstc/{VERSION}+{GIT_HASH}")
}
