//! Platform constants, generation options and their validation.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitterError};
use crate::resources::ResourceId;
use crate::targeting::{Abi, DensityAlias, Dimension};

/// Android 5.0 (Lollipop).
pub const SDK_L: u32 = 21;
/// Android 6.0 (Marshmallow).
pub const SDK_M: u32 = 23;
/// Android 7.0 (Nougat).
pub const SDK_N: u32 = 24;
/// Android 9 (Pie).
pub const SDK_P: u32 = 28;
/// Android 10.
pub const SDK_Q: u32 = 29;
/// Android 12.
pub const SDK_S: u32 = 31;
/// Android 13.
pub const SDK_T: u32 = 33;

/// Lowest SDK version able to install split APKs.
pub const SPLIT_APKS_MIN_SDK: u32 = SDK_L;

/// Lowest SDK version with the SDK runtime.
pub const SDK_RUNTIME_MIN_SDK: u32 = SDK_T;

/// Highest SDK version accepted in configuration.
pub const MAX_SDK_VERSION: u32 = 1000;

/// Density buckets that get their own split when density splitting is on.
pub const DEFAULT_DENSITY_BUCKETS: [DensityAlias; 7] = [
    DensityAlias::Ldpi,
    DensityAlias::Mdpi,
    DensityAlias::Tvdpi,
    DensityAlias::Hdpi,
    DensityAlias::Xhdpi,
    DensityAlias::Xxhdpi,
    DensityAlias::Xxxhdpi,
];

/// First tool version where an explicit MDPI value beats a value without
/// density qualifier.
pub const DENSITY_EXPLICIT_MDPI_VERSION: Version = Version::new(0, 9, 1);

/// File name used for placeholder native libraries.
pub const PLACEHOLDER_LIBRARY_NAME: &str = "libplaceholder.so";

/// Resource name, optionally prefixed with its type: `app_name` or `string/app_name`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static RESOURCE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z][a-z_-]*/)?[A-Za-z_][A-Za-z0-9_.]*$").expect("valid regex")
});

/// Dimensions that may be enabled for split generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationDimension {
    Abi,
    ScreenDensity,
    Language,
    TextureCompressionFormat,
    DeviceTier,
    CountrySet,
    DeviceGroup,
}

impl OptimizationDimension {
    /// Targeting dimension this option splits along.
    #[must_use]
    pub fn dimension(self) -> Dimension {
        match self {
            Self::Abi => Dimension::Abi,
            Self::ScreenDensity => Dimension::ScreenDensity,
            Self::Language => Dimension::Language,
            Self::TextureCompressionFormat => Dimension::TextureCompressionFormat,
            Self::DeviceTier => Dimension::DeviceTier,
            Self::CountrySet => Dimension::CountrySet,
            Self::DeviceGroup => Dimension::DeviceGroup,
        }
    }
}

/// Target SDK level for uncompressed dex files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncompressedDexTargetSdk {
    /// No explicit target; uncompressed dex from Android 10.
    #[default]
    Unspecified,
    /// Uncompressed dex from Android 12.
    Sdk31,
}

impl UncompressedDexTargetSdk {
    /// Minimum SDK of the variant serving uncompressed dex.
    #[must_use]
    pub fn min_sdk(self) -> u32 {
        match self {
            Self::Unspecified => SDK_Q,
            Self::Sdk31 => SDK_S,
        }
    }
}

/// Options controlling split and variant generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Dimensions along which splits are generated.
    pub optimization_dimensions: BTreeSet<OptimizationDimension>,
    /// Dimensions whose `#key_value` marker is removed from asset paths.
    pub suffix_stripping: BTreeSet<OptimizationDimension>,
    /// ABIs for which modules without native code get a placeholder library.
    pub placeholder_abis: BTreeSet<Abi>,
    /// Resources that always stay complete in the master split.
    pub master_pinned_resource_ids: BTreeSet<ResourceId>,
    /// Resource names (`name` or `type/name`) pinned to the master split.
    pub master_pinned_resource_names: BTreeSet<String>,
    /// Pin every resource reachable from the base manifest to master.
    pub pin_manifest_reachable_resources: bool,
    /// Serve native libraries uncompressed on supporting SDK levels.
    pub enable_uncompressed_native_libraries: bool,
    /// Serve dex files uncompressed on supporting SDK levels.
    pub enable_dex_compression_splitter: bool,
    pub dex_compression_target_sdk: UncompressedDexTargetSdk,
    /// Minimum SDK of the signing key rotation variant.
    pub min_sdk_for_signing_rotation: Option<u32>,
    /// Generate splits for instant apps.
    pub instant: bool,
    /// Tool version selecting density matching behaviour.
    pub density_tool_version: Version,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            optimization_dimensions: BTreeSet::from([
                OptimizationDimension::Abi,
                OptimizationDimension::ScreenDensity,
                OptimizationDimension::Language,
            ]),
            suffix_stripping: BTreeSet::new(),
            placeholder_abis: BTreeSet::new(),
            master_pinned_resource_ids: BTreeSet::new(),
            master_pinned_resource_names: BTreeSet::new(),
            pin_manifest_reachable_resources: false,
            enable_uncompressed_native_libraries: true,
            enable_dex_compression_splitter: false,
            dex_compression_target_sdk: UncompressedDexTargetSdk::default(),
            min_sdk_for_signing_rotation: None,
            instant: false,
            density_tool_version: Version::new(1, 0, 0),
        }
    }
}

impl GenerationConfig {
    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check option values.
    pub fn validate(&self) -> Result<()> {
        if let Some(sdk) = self.min_sdk_for_signing_rotation {
            validate_sdk_version(sdk)?;
        }
        for name in &self.master_pinned_resource_names {
            validate_resource_name(name)?;
        }
        Ok(())
    }

    /// Whether splitting along `dimension` is enabled.
    #[must_use]
    pub fn is_enabled(&self, dimension: OptimizationDimension) -> bool {
        self.optimization_dimensions.contains(&dimension)
    }

    /// Whether the `#key_value` marker of `dimension` is stripped from paths.
    #[must_use]
    pub fn strips_suffix(&self, dimension: OptimizationDimension) -> bool {
        self.suffix_stripping.contains(&dimension)
    }

    #[must_use]
    pub fn with_optimization_dimensions(
        mut self,
        dimensions: impl IntoIterator<Item = OptimizationDimension>,
    ) -> Self {
        self.optimization_dimensions = dimensions.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_suffix_stripping(mut self, dimension: OptimizationDimension) -> Self {
        self.suffix_stripping.insert(dimension);
        self
    }

    #[must_use]
    pub fn with_placeholder_abis(mut self, abis: impl IntoIterator<Item = Abi>) -> Self {
        self.placeholder_abis = abis.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_pinned_resource_ids(mut self, ids: impl IntoIterator<Item = ResourceId>) -> Self {
        self.master_pinned_resource_ids.extend(ids);
        self
    }

    #[must_use]
    pub fn with_pinned_resource_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.master_pinned_resource_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_uncompressed_native_libraries(mut self, enabled: bool) -> Self {
        self.enable_uncompressed_native_libraries = enabled;
        self
    }

    #[must_use]
    pub fn with_dex_compression(mut self, target: UncompressedDexTargetSdk) -> Self {
        self.enable_dex_compression_splitter = true;
        self.dex_compression_target_sdk = target;
        self
    }

    #[must_use]
    pub fn with_signing_rotation_min_sdk(mut self, sdk: u32) -> Self {
        self.min_sdk_for_signing_rotation = Some(sdk);
        self
    }

    #[must_use]
    pub fn with_instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    #[must_use]
    pub fn with_density_tool_version(mut self, version: Version) -> Self {
        self.density_tool_version = version;
        self
    }
}

/// Validate an SDK version number.
///
/// # Examples
/// ```
/// use bundlesplit_splitter::config::validate_sdk_version;
///
/// assert!(validate_sdk_version(28).is_ok());
/// assert!(validate_sdk_version(0).is_err());
/// ```
pub fn validate_sdk_version(sdk: u32) -> Result<()> {
    if (1..=MAX_SDK_VERSION).contains(&sdk) {
        Ok(())
    } else {
        Err(SplitterError::InvalidConfig(format!(
            "SDK version {sdk} is outside 1..={MAX_SDK_VERSION}"
        )))
    }
}

/// Validate a pinned resource name (`name` or `type/name`).
pub fn validate_resource_name(name: &str) -> Result<()> {
    if RESOURCE_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(SplitterError::InvalidConfig(format!(
            "invalid resource name '{name}'"
        )))
    }
}
