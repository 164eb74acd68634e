use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use datadrive_resource::{FileResource, ResourceError, TypedBindingMap};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::factory::DataProviderFactory;
use crate::provider::DataProvider;
use crate::registry::TypeRegistry;
use crate::validation::{ManifestIssue, ValidationError};

/// Manifest format version understood by this crate.
pub const CURRENT_MANIFEST_VERSION: &str = "1.0.0";
const SUPPORTED_MAJOR: u64 = 1;

static SOURCE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+([_-][a-z0-9]+)*$").expect("source id regex must compile")
});

/// A YAML list of the data files a test suite reads.
///
/// ```yaml
/// version: "1.0.0"
/// sources:
///   - id: orders
///     directory: testdata
///     file: orders.xml
///     type: OrderRecord
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceManifest {
    pub version: ManifestVersion,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

/// One data file and the type(s) its content binds to.
///
/// Location is either `path` or `directory` + `file`; typing is either
/// `type` or `bindings` (selector → type name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub config: ProviderConfig,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("source `{source_id}` refers to unregistered type `{type_name}`")]
    UnknownType {
        source_id: String,
        type_name: String,
    },

    #[error("source `{source_id}`: {error}")]
    Resource {
        source_id: String,
        #[source]
        error: ResourceError,
    },
}

/// A manifest entry turned into a ready-to-use resource.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub id: String,
    pub resource: FileResource,
    pub config: ProviderConfig,
}

impl ResolvedSource {
    /// Provider for this source, chosen by file extension.
    pub fn open(&self) -> Result<Box<dyn DataProvider>, ProviderError> {
        DataProviderFactory::open(self.resource.clone(), self.config.clone())
    }
}

impl DataSourceManifest {
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_yaml_reader(std::io::BufReader::new(file))?)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn source(&self, id: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Check structural rules and report every violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.version.0.major != SUPPORTED_MAJOR {
            issues.push(ManifestIssue::new(
                "version",
                format!(
                    "incompatible major version `{}` (expected `{}`)",
                    self.version, SUPPORTED_MAJOR
                ),
            ));
        }

        let mut seen_ids = HashSet::new();
        for (idx, source) in self.sources.iter().enumerate() {
            let base = format!("sources[{idx}]");
            if !SOURCE_ID.is_match(&source.id) {
                issues.push(ManifestIssue::new(
                    format!("{base}.id"),
                    "source id must contain lowercase alphanumeric characters optionally separated by '-' or '_'",
                ));
            }
            if !seen_ids.insert(source.id.as_str()) {
                issues.push(ManifestIssue::new(
                    format!("{base}.id"),
                    format!("duplicate source id `{}`", source.id),
                ));
            }
            source.check_location(&base, &mut issues);
            source.check_typing(&base, &mut issues);
            if source.config.header_row == 0 {
                issues.push(ManifestIssue::new(
                    format!("{base}.config.header_row"),
                    "header_row is 1-based",
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Validate, then build a [`FileResource`] per entry. Relative locations
    /// are joined onto `base_dir` when one is given.
    pub fn resolve(
        &self,
        registry: &TypeRegistry,
        base_dir: Option<&Path>,
    ) -> Result<Vec<ResolvedSource>, ManifestError> {
        self.validate()?;
        let resolved = self
            .sources
            .iter()
            .map(|source| source.resolve(registry, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(sources = resolved.len(), "resolved data source manifest");
        Ok(resolved)
    }
}

impl SourceEntry {
    /// File this entry points at, joined onto `base_dir` when relative.
    /// `None` when the entry has no usable location.
    pub fn file_path(&self, base_dir: Option<&Path>) -> Option<PathBuf> {
        let relative = match (&self.path, &self.directory, &self.file) {
            (Some(path), None, None) => path.clone(),
            (None, Some(directory), Some(file)) => directory.join(file),
            _ => return None,
        };
        Some(match base_dir {
            Some(base) => base.join(relative),
            None => relative,
        })
    }

    fn check_location(&self, base: &str, issues: &mut Vec<ManifestIssue>) {
        let split = self.directory.is_some() || self.file.is_some();
        match (&self.path, split) {
            (Some(_), true) => issues.push(ManifestIssue::new(
                base,
                "use either `path` or `directory` + `file`, not both",
            )),
            (None, false) => issues.push(ManifestIssue::new(
                base,
                "a source needs `path` or `directory` + `file`",
            )),
            (Some(path), false) if path.as_os_str().is_empty() => {
                issues.push(ManifestIssue::new(format!("{base}.path"), "path must not be empty"))
            }
            (Some(_), false) => {}
            (None, true) => {
                if self.directory.is_none() {
                    issues.push(ManifestIssue::new(
                        format!("{base}.directory"),
                        "`file` requires `directory`",
                    ));
                }
                match self.file.as_deref().map(str::trim) {
                    None => issues.push(ManifestIssue::new(
                        format!("{base}.file"),
                        "`directory` requires `file`",
                    )),
                    Some("") => issues.push(ManifestIssue::new(
                        format!("{base}.file"),
                        "file name must not be empty",
                    )),
                    Some(_) => {}
                }
            }
        }
    }

    fn check_typing(&self, base: &str, issues: &mut Vec<ManifestIssue>) {
        let bindings = self.bindings.as_ref().filter(|b| !b.is_empty());
        match (&self.type_name, bindings) {
            (Some(_), Some(_)) => issues.push(ManifestIssue::new(
                base,
                "use either `type` or `bindings`, not both",
            )),
            (None, None) => issues.push(ManifestIssue::new(
                base,
                "a source needs `type` or a non-empty `bindings` map",
            )),
            (Some(name), None) => {
                if name.trim().is_empty() {
                    issues.push(ManifestIssue::new(
                        format!("{base}.type"),
                        "type name must not be empty",
                    ));
                }
            }
            (None, Some(bindings)) => {
                for (selector, type_name) in bindings {
                    if selector.trim().is_empty() {
                        issues.push(ManifestIssue::new(
                            format!("{base}.bindings"),
                            "selector must not be empty",
                        ));
                    }
                    if type_name.trim().is_empty() {
                        issues.push(ManifestIssue::new(
                            format!("{base}.bindings[{selector}]"),
                            "type name must not be empty",
                        ));
                    }
                }
            }
        }
    }

    fn resolve(
        &self,
        registry: &TypeRegistry,
        base_dir: Option<&Path>,
    ) -> Result<ResolvedSource, ManifestError> {
        let lookup = |type_name: &str| {
            registry
                .get(type_name)
                .ok_or_else(|| ManifestError::UnknownType {
                    source_id: self.id.clone(),
                    type_name: type_name.to_string(),
                })
        };
        let rebase = |path: &Path| match base_dir {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        };

        let mut builder = match (&self.path, &self.directory) {
            (Some(path), _) => FileResource::path_builder(rebase(path)),
            (None, directory) => FileResource::builder(
                rebase(directory.as_deref().unwrap_or(Path::new(""))),
                self.file.as_deref().unwrap_or_default(),
            ),
        };
        if let Some(type_name) = &self.type_name {
            builder = builder.declared_type(lookup(type_name)?);
        }
        if let Some(bindings) = &self.bindings {
            let mut map = TypedBindingMap::new();
            for (selector, type_name) in bindings {
                map.insert(selector.as_str(), lookup(type_name)?)
                    .map_err(|error| self.resource_error(error))?;
            }
            builder = builder.bindings(map);
        }

        Ok(ResolvedSource {
            id: self.id.clone(),
            resource: builder.build().map_err(|error| self.resource_error(error))?,
            config: self.config.clone(),
        })
    }

    fn resource_error(&self, error: ResourceError) -> ManifestError {
        ManifestError::Resource {
            source_id: self.id.clone(),
            error,
        }
    }
}

/// Semantic version of the manifest format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestVersion(pub Version);

impl ManifestVersion {
    pub fn new(version: Version) -> Self {
        Self(version)
    }

    pub fn current() -> Self {
        Self(Version::new(SUPPORTED_MAJOR, 0, 0))
    }
}

impl fmt::Display for ManifestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for ManifestVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for ManifestVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = ManifestVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("semantic version string (e.g. 1.0.0)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Version::parse(v)
                    .map(ManifestVersion)
                    .map_err(|err| de::Error::custom(format!("invalid version: {err}")))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

impl std::str::FromStr for DataSourceManifest {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml_str(s)
    }
}
