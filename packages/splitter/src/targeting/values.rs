//! Value types for the individual targeting dimensions.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// CPU architecture a native library is compiled for.
///
/// Declaration order is the canonical ordering used for deterministic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Abi {
    #[serde(rename = "armeabi")]
    Armeabi,
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "mips")]
    Mips,
    #[serde(rename = "mips64")]
    Mips64,
    #[serde(rename = "riscv64")]
    Riscv64,
}

impl Abi {
    /// All known ABIs in canonical order.
    pub const ALL: [Abi; 8] = [
        Abi::Armeabi,
        Abi::ArmeabiV7a,
        Abi::Arm64V8a,
        Abi::X86,
        Abi::X86_64,
        Abi::Mips,
        Abi::Mips64,
        Abi::Riscv64,
    ];

    /// Directory name used under `lib/` (e.g. `arm64-v8a`).
    #[must_use]
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Armeabi => "armeabi",
            Self::ArmeabiV7a => "armeabi-v7a",
            Self::Arm64V8a => "arm64-v8a",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Mips => "mips",
            Self::Mips64 => "mips64",
            Self::Riscv64 => "riscv64",
        }
    }

    /// Parse a `lib/` directory name.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|abi| abi.dir_name() == name)
    }

    /// Split name fragment (dashes are not allowed in split ids).
    #[must_use]
    pub fn suffix(&self) -> String {
        self.dir_name().replace('-', "_")
    }

    /// Whether the ABI is a 64-bit architecture.
    #[must_use]
    pub fn is_64_bit(&self) -> bool {
        matches!(
            self,
            Self::Arm64V8a | Self::X86_64 | Self::Mips64 | Self::Riscv64
        )
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A combination of ABIs served together, as used by APEX images
/// (`apex/x86_64.x86.img`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MultiAbi(pub BTreeSet<Abi>);

impl MultiAbi {
    /// Create from any collection of ABIs.
    #[must_use]
    pub fn new(abis: impl IntoIterator<Item = Abi>) -> Self {
        Self(abis.into_iter().collect())
    }

    /// Split name fragment (`x86_64.x86`).
    #[must_use]
    pub fn suffix(&self) -> String {
        self.0
            .iter()
            .map(Abi::suffix)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Named screen density buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityAlias {
    /// Unspecified density; behaves like MDPI.
    Default,
    Ldpi,
    Mdpi,
    Tvdpi,
    Hdpi,
    Xhdpi,
    Xxhdpi,
    Xxxhdpi,
}

impl DensityAlias {
    /// Canonical dots-per-inch for the bucket.
    #[must_use]
    pub fn dpi(&self) -> u32 {
        match self {
            Self::Ldpi => 120,
            Self::Default | Self::Mdpi => 160,
            Self::Tvdpi => 213,
            Self::Hdpi => 240,
            Self::Xhdpi => 320,
            Self::Xxhdpi => 480,
            Self::Xxxhdpi => 640,
        }
    }

    /// Qualifier name as used in resource directories.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Ldpi => "ldpi",
            Self::Mdpi => "mdpi",
            Self::Tvdpi => "tvdpi",
            Self::Hdpi => "hdpi",
            Self::Xhdpi => "xhdpi",
            Self::Xxhdpi => "xxhdpi",
            Self::Xxxhdpi => "xxxhdpi",
        }
    }
}

/// A screen density, either a named bucket or a literal dpi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenDensity {
    Alias(DensityAlias),
    Dpi(u32),
}

impl ScreenDensity {
    /// Dots-per-inch represented by this density.
    #[must_use]
    pub fn dpi(&self) -> u32 {
        match self {
            Self::Alias(alias) => alias.dpi(),
            Self::Dpi(dpi) => *dpi,
        }
    }

    /// Split name fragment (`hdpi`, `280dpi`).
    #[must_use]
    pub fn suffix(&self) -> String {
        match self {
            Self::Alias(alias) => alias.name().to_string(),
            Self::Dpi(dpi) => format!("{dpi}dpi"),
        }
    }
}

impl From<DensityAlias> for ScreenDensity {
    fn from(alias: DensityAlias) -> Self {
        Self::Alias(alias)
    }
}

impl PartialOrd for ScreenDensity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScreenDensity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let rank = |d: &Self| match d {
            Self::Alias(alias) => (d.dpi(), 0, *alias as u32),
            Self::Dpi(_) => (d.dpi(), 1, 0),
        };
        rank(self).cmp(&rank(other))
    }
}

/// Texture compression formats recognised in `#tcf_` directory suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextureCompressionFormat {
    #[serde(rename = "etc1")]
    Etc1Rgb8,
    #[serde(rename = "paletted")]
    Paletted,
    #[serde(rename = "3dc")]
    ThreeDc,
    #[serde(rename = "atc")]
    Atc,
    #[serde(rename = "latc")]
    Latc,
    #[serde(rename = "dxt1")]
    Dxt1,
    #[serde(rename = "s3tc")]
    S3tc,
    #[serde(rename = "pvrtc")]
    Pvrtc,
    #[serde(rename = "astc")]
    Astc,
    #[serde(rename = "etc2")]
    Etc2,
}

impl TextureCompressionFormat {
    const ALL: [TextureCompressionFormat; 10] = [
        Self::Etc1Rgb8,
        Self::Paletted,
        Self::ThreeDc,
        Self::Atc,
        Self::Latc,
        Self::Dxt1,
        Self::S3tc,
        Self::Pvrtc,
        Self::Astc,
        Self::Etc2,
    ];

    /// Name used after `#tcf_`.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Etc1Rgb8 => "etc1",
            Self::Paletted => "paletted",
            Self::ThreeDc => "3dc",
            Self::Atc => "atc",
            Self::Latc => "latc",
            Self::Dxt1 => "dxt1",
            Self::S3tc => "s3tc",
            Self::Pvrtc => "pvrtc",
            Self::Astc => "astc",
            Self::Etc2 => "etc2",
        }
    }

    /// Parse the value following `#tcf_`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tcf| tcf.key() == key)
    }
}

/// Graphics API requirement from `#opengl_` / `#vulkan_` suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GraphicsApi {
    OpenGl { major: u32, minor: u32 },
    Vulkan { major: u32, minor: u32 },
}

impl GraphicsApi {
    /// Parse a `major.minor` version string for the given API key.
    #[must_use]
    pub fn parse(key: &str, version: &str) -> Option<Self> {
        let (major, minor) = match version.split_once('.') {
            Some((major, minor)) => (major.parse().ok()?, minor.parse().ok()?),
            None => (version.parse().ok()?, 0),
        };
        match key {
            "opengl" => Some(Self::OpenGl { major, minor }),
            "vulkan" => Some(Self::Vulkan { major, minor }),
            _ => None,
        }
    }

    /// Split name fragment (`opengl_3_1`).
    #[must_use]
    pub fn suffix(&self) -> String {
        match self {
            Self::OpenGl { major, minor } => format!("opengl_{major}_{minor}"),
            Self::Vulkan { major, minor } => format!("vulkan_{major}_{minor}"),
        }
    }
}
