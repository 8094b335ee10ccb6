//! Configuration types deserialized from `kiln.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level session configuration parsed from `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct KilnConfig {
    /// Process-wide settings shared by every container.
    pub session: SessionConfig,
    /// Build containers by name.
    #[serde(default)]
    pub containers: BTreeMap<String, ContainerConfig>,
    /// Debug-info installation settings.
    #[serde(default)]
    pub debug_info: Option<DebugInfoConfig>,
}

/// Settings that apply to the whole session.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Default encoding for parsing source units.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Language setup identifiers to register at startup.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Default classpath every container's classpath is layered over.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub classpath: Vec<String>,
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

/// One build container.
#[derive(Debug, Deserialize)]
pub struct ContainerConfig {
    /// Project directory; defaults to the directory holding `kiln.toml`.
    #[serde(default)]
    pub project_dir: Option<String>,
    /// Source directories scanned for units when no dirty list is given.
    #[serde(default = "default_sources", deserialize_with = "deserialize_string_or_vec")]
    pub sources: Vec<String>,
    /// Container-specific classpath entries.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub classpath: Vec<String>,
    /// Containers this one declares a dependency on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Output configuration: language identifier to outlet name to outlet.
    #[serde(default)]
    pub outputs: BTreeMap<String, BTreeMap<String, OutletConfig>>,
}

fn default_sources() -> Vec<String> {
    vec!["src".to_string()]
}

/// A named output slot of one language.
#[derive(Debug, Clone, Deserialize)]
pub struct OutletConfig {
    /// Directory generated files are written to.
    #[serde(default)]
    pub target: String,
    /// Create the target directory when it does not exist.
    #[serde(default = "default_true")]
    pub create_directory: bool,
    /// Overwrite existing files the builder did not generate.
    #[serde(default = "default_true")]
    pub overwrite_existing: bool,
    /// Delete generated files that are no longer produced.
    #[serde(default = "default_true")]
    pub cleanup_derived: bool,
}

fn default_true() -> bool {
    true
}

/// Settings for `kiln install-debug-info`.
#[derive(Debug, Deserialize)]
pub struct DebugInfoConfig {
    /// Directory holding compiled artifacts.
    pub classes_dir: String,
    /// Directory rewritten artifacts are written to; defaults to `classes_dir`.
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Installer settings by generated file extension.
    #[serde(default)]
    pub installers: BTreeMap<String, InstallerConfig>,
}

/// Installer settings for one generated file extension.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Installation strategy.
    #[serde(default)]
    pub installer: InstallerKind,
    /// Drop synthetic variables from installed variable tables.
    #[serde(default)]
    pub hide_synthetic_variables: bool,
}

/// Debug-info installation strategy.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    /// Make the source unit the primary source of the artifact (default).
    #[default]
    Primary,
    /// Attach an SMAP, keeping the generated file primary.
    Smap,
    /// Remove installed debug information.
    None,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `classpath = "lib"` as well as `classpath = ["lib", "vendor"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
