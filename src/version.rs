//! Build and version metadata.
//!
//! These values are consumed by external collaborators (the log writer,
//! CLI front-ends, language bindings) but carry no compatibility semantics
//! and are never consulted by the processing pipeline itself. `build.rs`
//! shells out to `rustc --version` once at build time and bakes the result
//! into an environment variable read here via `env!()`.

/// Crate version as `(major, minor, patch)`, parsed from the values Cargo
/// derives from `Cargo.toml` at compile time.
#[must_use]
pub fn version() -> (u32, u32, u32) {
    (
        env!("CARGO_PKG_VERSION_MAJOR")
            .parse()
            .expect("CARGO_PKG_VERSION_MAJOR is always a valid integer"),
        env!("CARGO_PKG_VERSION_MINOR")
            .parse()
            .expect("CARGO_PKG_VERSION_MINOR is always a valid integer"),
        env!("CARGO_PKG_VERSION_PATCH")
            .parse()
            .expect("CARGO_PKG_VERSION_PATCH is always a valid integer"),
    )
}

/// Date this build was compiled, e.g. `2026-07-31`. Stamped by `build.rs`.
pub const BUILD_DATE: &str = env!("DYNAUDNORM_BUILD_DATE");

/// Time of day this build was compiled, e.g. `14:32:07`. Stamped by
/// `build.rs`.
pub const BUILD_TIME: &str = env!("DYNAUDNORM_BUILD_TIME");

/// Identifier of the compiler used for this build, as reported by
/// `rustc --version`. Stamped by `build.rs`.
pub const BUILD_COMPILER: &str = env!("DYNAUDNORM_BUILD_COMPILER");

/// Target architecture triple this build was compiled for. Stamped by
/// `build.rs`.
pub const BUILD_ARCH: &str = env!("DYNAUDNORM_BUILD_ARCH");

/// `true` for debug builds, `false` for release builds.
#[must_use]
pub const fn is_debug_build() -> bool {
    cfg!(debug_assertions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_from_cargo_metadata() {
        let (major, minor, patch) = version();
        assert_eq!((major, minor, patch), (0, 1, 0));
    }

    #[test]
    fn build_metadata_strings_are_non_empty() {
        assert!(!BUILD_DATE.is_empty());
        assert!(!BUILD_TIME.is_empty());
        assert!(!BUILD_COMPILER.is_empty());
        assert!(!BUILD_ARCH.is_empty());
    }
}
