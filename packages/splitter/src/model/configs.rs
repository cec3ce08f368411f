//! Targeting configs for native libraries, assets and APEX images.
//!
//! Each config lists targeted directories (or image files) together with the
//! targeting their path encodes. They can be given explicitly or derived from
//! a module's entries.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SplitterError};
use crate::targeting::{Abi, AssetsDirectoryTargeting, MultiAbi, TargetedDirectory};

use super::entry::ModuleEntry;

pub const LIB_DIR: &str = "lib";
pub const ASSETS_DIR: &str = "assets";
pub const APEX_DIR: &str = "apex";
pub const DEX_DIR: &str = "dex";

const APEX_IMAGE_EXTENSION: &str = ".img";
const APEX_BUILD_INFO_EXTENSION: &str = ".build_info.pb";

/// A `lib/<abi>` directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetedNativeDirectory {
    pub path: String,
    /// `None` when the directory name is not a known ABI.
    pub abi: Option<Abi>,
}

/// Native library directories of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeLibraries {
    pub directories: Vec<TargetedNativeDirectory>,
}

impl NativeLibraries {
    /// One directory per distinct `lib/<name>` prefix among the entries.
    ///
    /// Returns `None` when the module has no native libraries.
    #[must_use]
    pub fn from_entries(entries: &[ModuleEntry]) -> Option<Self> {
        let names: BTreeSet<&str> = entries
            .iter()
            .filter_map(|e| e.path().strip_prefix("lib/"))
            .filter_map(|rest| rest.split_once('/').map(|(dir, _)| dir))
            .collect();
        if names.is_empty() {
            return None;
        }
        let directories = names
            .into_iter()
            .map(|name| TargetedNativeDirectory {
                path: format!("{LIB_DIR}/{name}"),
                abi: Abi::from_dir_name(name),
            })
            .collect();
        Some(Self { directories })
    }

    /// Restrict to directories matching `keep`.
    #[must_use]
    pub fn filtered(&self, keep: impl Fn(&TargetedNativeDirectory) -> bool) -> Self {
        Self {
            directories: self.directories.iter().filter(|d| keep(d)).cloned().collect(),
        }
    }
}

/// An assets directory with the targeting its path encodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetedAssetsDirectory {
    pub path: String,
    pub targeting: AssetsDirectoryTargeting,
}

/// Targeted assets directories of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetsConfig {
    pub directories: Vec<TargetedAssetsDirectory>,
}

impl AssetsConfig {
    /// One entry per asset parent directory whose path carries targeting.
    ///
    /// Returns `None` when no asset directory is targeted.
    pub fn from_entries(entries: &[ModuleEntry]) -> Result<Option<Self>> {
        let parents: BTreeSet<&str> = entries
            .iter()
            .filter(|e| e.is_under(ASSETS_DIR))
            .map(ModuleEntry::parent)
            .collect();

        let mut directories = Vec::new();
        for parent in parents {
            let targeting = TargetedDirectory::parse(parent)?.targeting();
            if !targeting.is_empty() {
                directories.push(TargetedAssetsDirectory {
                    path: parent.to_string(),
                    targeting,
                });
            }
        }

        Ok((!directories.is_empty()).then_some(Self { directories }))
    }

    /// Restrict to directories matching `keep`.
    #[must_use]
    pub fn filtered(&self, keep: impl Fn(&TargetedAssetsDirectory) -> bool) -> Self {
        Self {
            directories: self.directories.iter().filter(|d| keep(d)).cloned().collect(),
        }
    }
}

/// An APEX system image for a set of ABIs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetedApexImage {
    pub path: String,
    pub build_info_path: Option<String>,
    pub targeting: MultiAbi,
}

/// APEX images of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApexImages {
    pub images: Vec<TargetedApexImage>,
}

impl ApexImages {
    /// Collect `apex/<abi>[.<abi>...].img` images and their build info files.
    ///
    /// Returns `None` when the module has no APEX images.
    pub fn from_entries(entries: &[ModuleEntry]) -> Result<Option<Self>> {
        let paths: BTreeSet<&str> = entries.iter().map(ModuleEntry::path).collect();
        let mut images = BTreeMap::new();

        for path in &paths {
            let Some(file) = path.strip_prefix("apex/") else {
                continue;
            };
            let Some(stem) = file.strip_suffix(APEX_IMAGE_EXTENSION) else {
                continue;
            };
            let abis = stem
                .split('.')
                .map(|name| {
                    Abi::from_dir_name(name).ok_or_else(|| SplitterError::InvalidTargetedDirectory {
                        path: path.to_string(),
                        reason: format!("unknown ABI '{name}' in APEX image name"),
                    })
                })
                .collect::<Result<BTreeSet<_>>>()?;
            let build_info = format!("{APEX_DIR}/{stem}{APEX_BUILD_INFO_EXTENSION}");
            images.insert(
                path.to_string(),
                TargetedApexImage {
                    path: path.to_string(),
                    build_info_path: paths.contains(build_info.as_str()).then_some(build_info),
                    targeting: MultiAbi(abis),
                },
            );
        }

        if images.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            images: images.into_values().collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targeting::{DimensionTargeting, TextureCompressionFormat};
    use pretty_assertions::assert_eq;

    fn entries(paths: &[&str]) -> Vec<ModuleEntry> {
        paths.iter().map(|p| ModuleEntry::new(*p, "x")).collect()
    }

    #[test]
    fn test_native_from_entries() {
        let native = NativeLibraries::from_entries(&entries(&[
            "lib/x86/liba.so",
            "lib/x86/libb.so",
            "lib/arm64-v8a/liba.so",
            "lib/sparc/liba.so",
            "dex/classes.dex",
        ]))
        .unwrap();
        assert_eq!(
            native.directories,
            vec![
                TargetedNativeDirectory {
                    path: "lib/arm64-v8a".to_string(),
                    abi: Some(Abi::Arm64V8a),
                },
                TargetedNativeDirectory {
                    path: "lib/sparc".to_string(),
                    abi: None,
                },
                TargetedNativeDirectory {
                    path: "lib/x86".to_string(),
                    abi: Some(Abi::X86),
                },
            ]
        );
        assert!(NativeLibraries::from_entries(&entries(&["res/a.png"])).is_none());
    }

    #[test]
    fn test_assets_from_entries_skips_untargeted() {
        let config = AssetsConfig::from_entries(&entries(&[
            "assets/sounds/a.ogg",
            "assets/textures#tcf_atc/a.ktx",
            "assets/textures#tcf_atc/b.ktx",
            "assets/textures#tcf_pvrtc/a.ktx",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.directories.len(), 2);
        assert_eq!(config.directories[0].path, "assets/textures#tcf_atc");
        assert_eq!(
            config.directories[0].targeting.texture_compression_format,
            Some(DimensionTargeting::of(TextureCompressionFormat::Atc))
        );
    }

    #[test]
    fn test_assets_from_entries_propagates_parse_errors() {
        assert!(AssetsConfig::from_entries(&entries(&["assets/x#tcf_bc7/a"])).is_err());
        assert!(AssetsConfig::from_entries(&entries(&["assets/plain/a"]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_apex_from_entries_pairs_build_info() {
        let apex = ApexImages::from_entries(&entries(&[
            "apex/x86_64.x86.img",
            "apex/x86_64.x86.build_info.pb",
            "apex/arm64-v8a.img",
            "apex_manifest.json",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(apex.images.len(), 2);
        let x86 = &apex.images[1];
        assert_eq!(x86.path, "apex/x86_64.x86.img");
        assert_eq!(
            x86.build_info_path.as_deref(),
            Some("apex/x86_64.x86.build_info.pb")
        );
        assert_eq!(x86.targeting, MultiAbi::new([Abi::X86, Abi::X86_64]));
        assert_eq!(apex.images[0].build_info_path, None);
    }

    #[test]
    fn test_apex_rejects_unknown_abi() {
        assert!(ApexImages::from_entries(&entries(&["apex/sparc.img"])).is_err());
    }
}
