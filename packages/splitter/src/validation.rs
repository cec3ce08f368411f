//! Module layout validation, run before splitting.

use std::collections::BTreeSet;

use crate::config::SPLIT_APKS_MIN_SDK;
use crate::error::{Result, SplitterError};
use crate::model::{BundleModule, LIB_DIR};

/// Reject modules that can never be served as split APKs.
pub fn validate_sdk_range(module: &BundleModule) -> Result<()> {
    match module.manifest.max_sdk() {
        Some(max_sdk) if max_sdk < SPLIT_APKS_MIN_SDK => Err(SplitterError::MaxSdkTooLow {
            module: module.name.clone(),
            max_sdk,
            min_supported: SPLIT_APKS_MIN_SDK,
        }),
        _ => Ok(()),
    }
}

/// Check that native libraries follow `lib/<abi>/<file>` and that every
/// targeted directory is consistent with the module's entries.
pub fn validate_native_layout(module: &BundleModule) -> Result<()> {
    let native_paths: Vec<&str> = module.entries_under(LIB_DIR).map(|e| e.path()).collect();

    for path in &native_paths {
        if path.split('/').count() != 3 {
            return Err(SplitterError::InvalidNativeLibraryPath(path.to_string()));
        }
    }

    let Some(native) = &module.native_config else {
        return match native_paths.first() {
            Some(path) => Err(SplitterError::UntargetedNativeDirectory(
                parent_dir(path).to_string(),
            )),
            None => Ok(()),
        };
    };

    let mut targeted = BTreeSet::new();
    for directory in &native.directories {
        if directory.abi.is_none() {
            return Err(SplitterError::NativeDirectoryMissingAbi(directory.path.clone()));
        }
        if !native_paths.iter().any(|p| parent_dir(p) == directory.path) {
            return Err(SplitterError::EmptyTargetedDirectory(directory.path.clone()));
        }
        targeted.insert(directory.path.as_str());
    }

    for path in &native_paths {
        let dir = parent_dir(path);
        if !targeted.contains(dir) {
            return Err(SplitterError::UntargetedNativeDirectory(dir.to_string()));
        }
    }
    Ok(())
}

/// Check that every targeted assets directory holds at least one file.
pub fn validate_assets_layout(module: &BundleModule) -> Result<()> {
    let Some(assets) = &module.assets_config else {
        return Ok(());
    };
    for directory in &assets.directories {
        if module.entries_under(&directory.path).next().is_none() {
            return Err(SplitterError::EmptyTargetedDirectory(directory.path.clone()));
        }
    }
    Ok(())
}

/// Run all checks.
pub fn validate_module(module: &BundleModule) -> Result<()> {
    validate_sdk_range(module)?;
    validate_native_layout(module)?;
    validate_assets_layout(module)
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}
