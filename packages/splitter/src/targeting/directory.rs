//! Parser for targeted directory names.
//!
//! Directory segments encode targeting as `name#key_value`, with several
//! keys chainable on one segment:
//!
//! ```text
//! assets/textures#countries_latam#tcf_etc1/hero.ktx
//!        └──────┘ └─────────────┘ └──────┘
//!          name      country set    texture format
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Dimension, DimensionTargeting, GraphicsApi, TextureCompressionFormat};
use crate::error::{Result, SplitterError};

/// `key_value` token after a `#`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TARGETING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(lang|tcf|tier|countries|group|opengl|vulkan)_(.+)$").expect("valid regex")
});

/// Two or three letter language code.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LANGUAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}$").expect("valid regex"));

/// Country set and device group names.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").expect("valid regex"));

/// Targeting of an assets directory, accumulated over its path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsDirectoryTargeting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<DimensionTargeting<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_compression_format: Option<DimensionTargeting<TextureCompressionFormat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_tier: Option<DimensionTargeting<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_set: Option<DimensionTargeting<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphics_api: Option<DimensionTargeting<GraphicsApi>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_group: Option<DimensionTargeting<String>>,
}

impl AssetsDirectoryTargeting {
    /// Whether no dimension is targeted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One `/`-separated segment of a targeted directory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedDirectorySegment {
    /// Name before the first `#`.
    pub name: String,
    /// Targeting contributed by this segment.
    pub targeting: AssetsDirectoryTargeting,
    tokens: Vec<(Dimension, String)>,
}

impl TargetedDirectorySegment {
    /// Parse a single segment such as `textures#tcf_astc#tier_1`.
    pub fn parse(segment: &str) -> Result<Self> {
        let mut parts = segment.split('#');
        let name = parts.next().unwrap_or_default().to_string();
        let invalid = |reason: String| SplitterError::InvalidTargetedDirectory {
            path: segment.to_string(),
            reason,
        };

        if name.is_empty() && segment.contains('#') {
            return Err(invalid("segment name must not be empty".to_string()));
        }

        let mut targeting = AssetsDirectoryTargeting::default();
        let mut tokens = Vec::new();

        for token in parts {
            let captures = TARGETING_TOKEN
                .captures(token)
                .ok_or_else(|| invalid(format!("unrecognized targeting key in '#{token}'")))?;
            let key = captures.get(1).map_or("", |m| m.as_str());
            let value = captures.get(2).map_or("", |m| m.as_str());

            let dimension = match key {
                "lang" => {
                    if !LANGUAGE_PATTERN.is_match(value) {
                        return Err(invalid(format!("invalid language '{value}'")));
                    }
                    set_once(&mut targeting.language, value.to_string())
                        .then_some(Dimension::Language)
                }
                "tcf" => {
                    let tcf = TextureCompressionFormat::from_key(value)
                        .ok_or_else(|| invalid(format!("unknown texture format '{value}'")))?;
                    set_once(&mut targeting.texture_compression_format, tcf)
                        .then_some(Dimension::TextureCompressionFormat)
                }
                "tier" => {
                    let tier: i32 = value
                        .parse()
                        .ok()
                        .filter(|tier| *tier >= 0)
                        .ok_or_else(|| invalid(format!("invalid device tier '{value}'")))?;
                    set_once(&mut targeting.device_tier, tier).then_some(Dimension::DeviceTier)
                }
                "countries" => {
                    if !NAME_PATTERN.is_match(value) {
                        return Err(invalid(format!("invalid country set '{value}'")));
                    }
                    set_once(&mut targeting.country_set, value.to_string())
                        .then_some(Dimension::CountrySet)
                }
                "group" => {
                    if !NAME_PATTERN.is_match(value) {
                        return Err(invalid(format!("invalid device group '{value}'")));
                    }
                    set_once(&mut targeting.device_group, value.to_string())
                        .then_some(Dimension::DeviceGroup)
                }
                _ => {
                    let api = GraphicsApi::parse(key, value)
                        .ok_or_else(|| invalid(format!("invalid graphics API version '{value}'")))?;
                    set_once(&mut targeting.graphics_api, api).then_some(Dimension::GraphicsApi)
                }
            };

            let dimension = dimension
                .ok_or_else(|| invalid(format!("duplicate targeting key '{key}'")))?;
            tokens.push((dimension, token.to_string()));
        }

        Ok(Self {
            name,
            targeting,
            tokens,
        })
    }

    /// Render the segment, optionally leaving out one dimension.
    fn render(&self, without: Option<Dimension>) -> String {
        let mut out = self.name.clone();
        for (dimension, token) in &self.tokens {
            if Some(*dimension) != without {
                out.push('#');
                out.push_str(token);
            }
        }
        out
    }

    fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.tokens.iter().map(|(dimension, _)| *dimension)
    }
}

/// Store `value` in an empty slot. Returns `false` if the slot was taken.
fn set_once<T: Ord + Clone>(slot: &mut Option<DimensionTargeting<T>>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(DimensionTargeting::of(value));
    true
}

/// A directory path whose segments may carry targeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedDirectory {
    pub segments: Vec<TargetedDirectorySegment>,
}

impl TargetedDirectory {
    /// Parse a directory path (without trailing file name).
    ///
    /// A dimension may be targeted by at most one segment of the path.
    pub fn parse(path: &str) -> Result<Self> {
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(TargetedDirectorySegment::parse)
            .collect::<Result<Vec<_>>>()?;

        let mut seen = Vec::new();
        for dimension in segments.iter().flat_map(TargetedDirectorySegment::dimensions) {
            if seen.contains(&dimension) {
                return Err(SplitterError::InvalidTargetedDirectory {
                    path: path.to_string(),
                    reason: format!("dimension {dimension:?} is targeted more than once"),
                });
            }
            seen.push(dimension);
        }

        Ok(Self { segments })
    }

    /// Combined targeting of all segments.
    #[must_use]
    pub fn targeting(&self) -> AssetsDirectoryTargeting {
        let mut combined = AssetsDirectoryTargeting::default();
        for segment in &self.segments {
            let t = &segment.targeting;
            combined.language = combined.language.or_else(|| t.language.clone());
            combined.texture_compression_format = combined
                .texture_compression_format
                .or_else(|| t.texture_compression_format.clone());
            combined.device_tier = combined.device_tier.or_else(|| t.device_tier.clone());
            combined.country_set = combined.country_set.or_else(|| t.country_set.clone());
            combined.graphics_api = combined.graphics_api.or_else(|| t.graphics_api.clone());
            combined.device_group = combined.device_group.or_else(|| t.device_group.clone());
        }
        combined
    }

    /// Render the full path.
    #[must_use]
    pub fn path(&self) -> String {
        self.render(None)
    }

    /// Render the path with every `#key_value` of `dimension` removed.
    #[must_use]
    pub fn path_without(&self, dimension: Dimension) -> String {
        self.render(Some(dimension))
    }

    fn render(&self, without: Option<Dimension>) -> String {
        self.segments
            .iter()
            .map(|segment| segment.render(without))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Remove the `dimension` targeting from the directory part of a file path.
///
/// `assets/tex#tcf_etc1/a.ktx` becomes `assets/tex/a.ktx` for the texture
/// compression format dimension.
pub fn strip_dimension_from_path(path: &str, dimension: Dimension) -> Result<String> {
    match path.rsplit_once('/') {
        Some((dir, file)) => {
            let stripped = TargetedDirectory::parse(dir)?.path_without(dimension);
            Ok(format!("{stripped}/{file}"))
        }
        None => Ok(path.to_string()),
    }
}
