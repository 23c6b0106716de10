//! # skucode-core
//!
//! Build information and the fixed layout of generated product codes.
//!
//! This crate has no workspace dependencies, so every other crate may import it.
//!
//! ## Contents
//!
//! - [`build_info()`] / [`BuildInfo`] - compile-time metadata for `skc info`
//! - [`CodeFormat`] - widths, delimiter and sentinels shared by every code generator

/// Compile-time facts about the running binary, as reported by `skc info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    /// Crate name.
    pub name: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Minimum supported Rust version of the workspace.
    pub msrv: &'static str,
    /// CPU architecture (`x86_64`, `aarch64`, ...).
    pub arch: &'static str,
    /// Operating system (`linux`, `macos`, ...).
    pub os: &'static str,
    /// `debug` or `release`.
    pub profile: &'static str,
    /// Short commit hash, when `GIT_HASH` was set at build time.
    pub git_hash: Option<&'static str>,
    /// Set when `GIT_DIRTY` was present at build time.
    pub git_dirty: bool,
}

impl BuildInfo {
    /// `name version`, followed by `(hash)` or `(hash-dirty)` for git builds.
    ///
    /// ```
    /// use skucode_core::build_info;
    ///
    /// let line = build_info().version_string();
    /// assert!(line.starts_with("skucode-core "));
    /// ```
    #[must_use]
    pub fn version_string(&self) -> String {
        let base = format!("{} {}", self.name, self.version);
        match self.git_hash {
            Some(hash) if self.git_dirty => format!("{base} ({hash}-dirty)"),
            Some(hash) => format!("{base} ({hash})"),
            None => base,
        }
    }

    /// `arch-os`.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}-{}", self.arch, self.os)
    }
}

/// Build metadata of this binary.
#[must_use]
pub const fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        msrv: env!("CARGO_PKG_RUST_VERSION"),
        arch: std::env::consts::ARCH,
        os: std::env::consts::OS,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        git_hash: option_env!("GIT_HASH"),
        git_dirty: option_env!("GIT_DIRTY").is_some(),
    }
}

/// Fixed layout of the generated codes.
///
/// A short code is `category(3) + make(2) + model(2) + serial(2) + suffix`.
/// Family and feature codes are joined with [`CodeFormat::DELIMITER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFormat;

impl CodeFormat {
    /// Segment delimiter for family and feature codes.
    pub const DELIMITER: char = '-';
    /// Width of the category segment of the short-code prefix.
    pub const CATEGORY_WIDTH: usize = 3;
    /// Width of each of the make and model segments.
    pub const VEHICLE_PART_WIDTH: usize = 2;
    /// Width of the serial segment.
    pub const SERIAL_WIDTH: usize = 2;
    /// Placeholder value that renders as empty.
    pub const EMPTY_SENTINEL: &'static str = "00";
    /// Maximum length of a fallback extraction token.
    pub const FALLBACK_TOKEN_LEN: usize = 5;
    /// Largest serial representable in [`CodeFormat::SERIAL_WIDTH`] digits.
    pub const MAX_SERIAL: u32 = 99;
    /// Category segment used when a category has no short code.
    pub const DEFAULT_CATEGORY_CODE: &'static str = "999";
    /// Default cap on the parent-category walk.
    pub const DEFAULT_MAX_PARENT_DEPTH: u32 = 32;

    /// Total prefix width (category + make + model).
    #[must_use]
    pub const fn prefix_width() -> usize {
        Self::CATEGORY_WIDTH + 2 * Self::VEHICLE_PART_WIDTH
    }

    /// Renders a serial zero-padded to [`CodeFormat::SERIAL_WIDTH`].
    ///
    /// ```
    /// use skucode_core::CodeFormat;
    ///
    /// assert_eq!(CodeFormat::format_serial(3), "03");
    /// assert_eq!(CodeFormat::format_serial(42), "42");
    /// ```
    #[must_use]
    pub fn format_serial(serial: u32) -> String {
        format!("{serial:0width$}", width = Self::SERIAL_WIDTH)
    }
}
