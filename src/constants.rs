//! Constants used throughout the preprocessor

/// Configuration files read when `--configs` is not given, later files override earlier ones
pub const DEFAULT_CONFIG_FILES: &[&str] = &["preprocess.ini.default", "preprocess.ini"];

/// Shipped defaults copied to the local override file on first run
pub const DEFAULT_INI: &str = "preprocess.ini.default";

/// Local, developer-specific override file
pub const LOCAL_INI: &str = "preprocess.ini";

/// Job manifest file names in order of preference
pub const MANIFEST_FILENAMES: &[&str] =
    &["preprocess.json", "preprocess.yaml", "preprocess.yml"];

/// INI section names
pub mod sections {
    /// Section holding the definitions handed to the substitution engine
    pub const DEFINES: &str = "defines";
    /// Section holding interpolation-only values
    pub const DEFAULT: &str = "DEFAULT";
}

/// Names available for interpolation inside configuration values only
pub mod synthetic {
    pub const USERNAME: &str = "USERNAME";
    pub const TIMESTAMP: &str = "TIMESTAMP";
    pub const ALL: &[&str] = &[USERNAME, TIMESTAMP];
}

/// Maximum nesting of references while interpolating a configuration value
pub const MAX_INTERPOLATION_DEPTH: usize = 10;

/// Maximum nesting of `include` directives
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Template file suffixes
pub mod suffixes {
    pub const DOT_IN: &str = ".in";
    pub const TEMPLATE: &str = ".template";
}

/// Directive markers
pub mod markers {
    pub const DEFAULT: &str = "#";
    pub const JAVA: &str = "//#";
}

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    /// Dry run found outputs that would be created or updated.
    pub const NEEDS_UPDATE: i32 = 1;
    pub const FAILURE: i32 = 2;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
