//! Error types for the splitter.
//!
//! `SplitterError` is what library consumers see. Reading nested XML
//! resources has its own `XmlReadError`, which the resource analyzer wraps
//! with the module and path it was resolving.

use thiserror::Error;

/// Failure while decoding an XML resource referenced from the resource table.
#[derive(Debug, Error)]
pub enum XmlReadError {
    /// The referenced file is not part of the module.
    #[error("entry not found in module")]
    MissingEntry,

    /// The entry content is not valid UTF-8.
    #[error("entry is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The entry content is not well-formed XML.
    #[error("XML parsing failed: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// Main error type for the splitter library.
#[derive(Debug, Error)]
pub enum SplitterError {
    /// A native library directory is listed as targeted but carries no ABI.
    #[error("Targeted native directory '{0}' has no ABI targeting")]
    NativeDirectoryMissingAbi(String),

    /// A native library entry is not exactly `lib/<abi>/<file>`.
    #[error("Native library '{0}' must be located at lib/<abi>/<file>")]
    InvalidNativeLibraryPath(String),

    /// A targeted directory contains no files.
    #[error("Targeted directory '{0}' is empty")]
    EmptyTargetedDirectory(String),

    /// A native library directory exists that no targeting entry covers.
    #[error("Native directory '{0}' is not covered by the native libraries config")]
    UntargetedNativeDirectory(String),

    /// A directory name does not follow the `name#key_value` convention.
    #[error("Invalid targeted directory '{path}': {reason}")]
    InvalidTargetedDirectory { path: String, reason: String },

    /// The module cannot be served as split APKs.
    #[error(
        "Module '{module}' declares maxSdkVersion {max_sdk}, below the split APK minimum of {min_supported}"
    )]
    MaxSdkTooLow {
        module: String,
        max_sdk: u32,
        min_supported: u32,
    },

    /// A splitter was applied to a split it cannot handle.
    #[error("Splitter precondition failed: {0}")]
    PreconditionFailed(String),

    /// Splitter composition produced an inconsistent result.
    #[error("Internal consistency failure: {0}")]
    InternalConsistency(String),

    /// A nested XML resource could not be read during reachability analysis.
    #[error("Failed to read resource file '{path}' in module '{module}': {source}")]
    ResourceFileRead {
        module: String,
        path: String,
        #[source]
        source: XmlReadError,
    },

    /// The manifest could not be decoded.
    #[error("Invalid manifest for module '{module}': {source}")]
    InvalidManifest {
        module: String,
        #[source]
        source: XmlReadError,
    },

    /// The requested module does not exist in the bundle.
    #[error("Module not found in bundle: {0}")]
    ModuleNotFound(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Configuration parsing failed: {0}")]
    ConfigParse(#[from] serde_yaml_ng::Error),

    /// Configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for splitter operations.
pub type Result<T> = std::result::Result<T, SplitterError>;
