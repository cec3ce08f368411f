//! Module manifest.
//!
//! Only the parts of the manifest that splitting and variant generation read
//! or write are given typed accessors; everything else is carried as-is in
//! the underlying [`XmlNode`] tree.

use crate::error::XmlReadError;
use crate::resources::ResourceId;

use super::xml::XmlNode;

const NATIVE_ACTIVITY_CLASS: &str = "android.app.NativeActivity";
const NATIVE_LIB_NAME_META_DATA: &str = "android.app.lib_name";
const SPLITS_REQUIRED_META_DATA: &str = "com.android.vending.splits.required";

/// An `AndroidManifest.xml` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidManifest {
    root: XmlNode,
}

impl AndroidManifest {
    /// Wrap a `<manifest>` element.
    #[must_use]
    pub fn from_node(root: XmlNode) -> Self {
        Self { root }
    }

    /// Minimal manifest for `package`.
    #[must_use]
    pub fn new(package: &str) -> Self {
        Self::from_node(
            XmlNode::element("manifest")
                .with_attribute("package", package)
                .with_child(XmlNode::element("application")),
        )
    }

    /// Decode a textual manifest.
    pub fn parse(text: &str) -> Result<Self, XmlReadError> {
        XmlNode::parse(text).map(Self::from_node)
    }

    /// The underlying element tree.
    #[must_use]
    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.root.attribute_value("package")
    }

    #[must_use]
    pub fn version_code(&self) -> Option<u32> {
        self.root
            .attribute_value("versionCode")
            .and_then(|v| v.parse().ok())
    }

    /// Split id written on the `<manifest>` element.
    #[must_use]
    pub fn split_id(&self) -> Option<&str> {
        self.root.attribute_value("split")
    }

    /// `uses-sdk@minSdkVersion`, defaulting to 1.
    #[must_use]
    pub fn min_sdk(&self) -> u32 {
        self.uses_sdk("minSdkVersion").unwrap_or(1)
    }

    /// `uses-sdk@maxSdkVersion`, if declared.
    #[must_use]
    pub fn max_sdk(&self) -> Option<u32> {
        self.uses_sdk("maxSdkVersion")
    }

    fn uses_sdk(&self, attribute: &str) -> Option<u32> {
        self.root
            .child("uses-sdk")
            .and_then(|node| node.attribute_value(attribute))
            .and_then(|v| v.parse().ok())
    }

    /// Whether `installLocation` allows installing on external storage.
    #[must_use]
    pub fn is_installable_on_external_storage(&self) -> bool {
        matches!(
            self.root.attribute_value("installLocation"),
            Some("auto" | "preferExternal")
        )
    }

    /// `application@hasCode`, defaulting to true.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.application()
            .and_then(|app| app.attribute_value("hasCode"))
            .map_or(true, |v| v != "false")
    }

    /// Whether the app has a native entry point: a `NativeActivity` or an
    /// activity declaring `android.app.lib_name`.
    #[must_use]
    pub fn has_native_activity(&self) -> bool {
        let Some(app) = self.application() else {
            return false;
        };
        app.children_named("activity").any(|activity| {
            activity.attribute_value("name") == Some(NATIVE_ACTIVITY_CLASS)
                || activity
                    .children_named("meta-data")
                    .any(|m| m.attribute_value("name") == Some(NATIVE_LIB_NAME_META_DATA))
        })
    }

    /// Whether the application is marked as requiring its config splits.
    #[must_use]
    pub fn splits_required(&self) -> bool {
        self.application()
            .and_then(|app| app.attribute_value("isSplitRequired"))
            == Some("true")
    }

    /// `application@extractNativeLibs`, if declared.
    #[must_use]
    pub fn extract_native_libs(&self) -> Option<bool> {
        self.application()
            .and_then(|app| app.attribute_value("extractNativeLibs"))
            .map(|v| v == "true")
    }

    /// Resource ids referenced by compiled attribute values.
    #[must_use]
    pub fn resource_references(&self) -> Vec<ResourceId> {
        self.root.compiled_references()
    }

    fn application(&self) -> Option<&XmlNode> {
        self.root.child("application")
    }

    /// Write the split id.
    pub fn set_split_id(&mut self, split_id: &str) {
        self.root.set_attribute("split", split_id);
    }

    /// Mark the application as requiring its config splits.
    pub fn set_splits_required(&mut self) {
        let app = self.root.child_mut_or_insert("application");
        app.set_attribute("isSplitRequired", "true");
        let present = app
            .children_named("meta-data")
            .any(|m| m.attribute_value("name") == Some(SPLITS_REQUIRED_META_DATA));
        if !present {
            app.children.push(
                XmlNode::element("meta-data")
                    .with_attribute("name", SPLITS_REQUIRED_META_DATA)
                    .with_attribute("value", "true"),
            );
        }
    }

    pub fn set_extract_native_libs(&mut self, extract: bool) {
        self.root
            .child_mut_or_insert("application")
            .set_attribute("extractNativeLibs", if extract { "true" } else { "false" });
    }

    /// Manifest of a config split.
    ///
    /// `feature` names the feature module the split configures; base module
    /// config splits carry no `configForSplit`.
    #[must_use]
    pub fn for_config_split(
        package: &str,
        version_code: Option<u32>,
        split_id: &str,
        feature: Option<&str>,
    ) -> Self {
        let mut root = XmlNode::element("manifest")
            .with_attribute("package", package)
            .with_attribute("split", split_id);
        if let Some(version_code) = version_code {
            root.set_attribute("versionCode", version_code.to_string());
        }
        if let Some(feature) = feature {
            root.set_attribute("configForSplit", feature);
        }
        let root =
            root.with_child(XmlNode::element("application").with_attribute("hasCode", "false"));
        Self::from_node(root)
    }
}
