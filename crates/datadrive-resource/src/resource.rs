use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::binding::TypedBindingMap;
use crate::descriptor::TypeDescriptor;
use crate::error::ResourceError;

/// What a resource's content binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// No declared type and no bindings. Valid to build, but providers
    /// reject it.
    Untyped,
    /// The whole file represents one type.
    SingleType(TypeDescriptor),
    /// Several selectors inside the file, each bound to its own type. The map
    /// is never empty.
    MultiType(TypedBindingMap),
}

/// Immutable descriptor of a structured data file and the type(s) its
/// content represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    path: PathBuf,
    kind: ResourceKind,
}

impl FileResource {
    /// Single-typed resource at `directory` joined with `file_name`.
    pub fn new(
        directory: impl AsRef<Path>,
        file_name: impl AsRef<Path>,
        declared_type: TypeDescriptor,
    ) -> Result<Self, ResourceError> {
        Self::builder(directory, file_name)
            .declared_type(declared_type)
            .build()
    }

    /// Single-typed resource at a full path, used verbatim.
    pub fn from_path(
        full_path: impl AsRef<Path>,
        declared_type: TypeDescriptor,
    ) -> Result<Self, ResourceError> {
        Self::path_builder(full_path)
            .declared_type(declared_type)
            .build()
    }

    /// Multi-typed resource at `directory` joined with `file_name`.
    pub fn with_bindings(
        directory: impl AsRef<Path>,
        file_name: impl AsRef<Path>,
        bindings: TypedBindingMap,
    ) -> Result<Self, ResourceError> {
        Self::builder(directory, file_name).bindings(bindings).build()
    }

    /// Multi-typed resource at a full path, used verbatim.
    pub fn from_path_with_bindings(
        full_path: impl AsRef<Path>,
        bindings: TypedBindingMap,
    ) -> Result<Self, ResourceError> {
        Self::path_builder(full_path).bindings(bindings).build()
    }

    pub fn builder(directory: impl AsRef<Path>, file_name: impl AsRef<Path>) -> FileResourceBuilder {
        FileResourceBuilder::new(Location::Joined {
            directory: directory.as_ref().to_path_buf(),
            file_name: file_name.as_ref().to_path_buf(),
        })
    }

    pub fn path_builder(full_path: impl AsRef<Path>) -> FileResourceBuilder {
        FileResourceBuilder::new(Location::Full(full_path.as_ref().to_path_buf()))
    }

    /// Resolved file identity.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(OsStr::to_str)
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// The single declared type, or `None` for multi-typed and untyped
    /// resources.
    pub fn declared_type(&self) -> Option<&TypeDescriptor> {
        match &self.kind {
            ResourceKind::SingleType(declared) => Some(declared),
            _ => None,
        }
    }

    /// Selector bindings, or `None` when none were configured (or the
    /// configured map was empty).
    pub fn bindings(&self) -> Option<&TypedBindingMap> {
        match &self.kind {
            ResourceKind::MultiType(bindings) => Some(bindings),
            _ => None,
        }
    }

    /// Type bound to `selector`. Distinguishes a resource without bindings
    /// ([`ResourceError::NoBindings`]) from an unregistered selector
    /// ([`ResourceError::NotFound`]).
    pub fn binding_for(&self, selector: &str) -> Result<&TypeDescriptor, ResourceError> {
        match &self.kind {
            ResourceKind::MultiType(bindings) => bindings.get(selector),
            _ => Err(ResourceError::NoBindings {
                path: self.path.display().to_string(),
            }),
        }
    }

    pub fn is_single_type(&self) -> bool {
        matches!(self.kind, ResourceKind::SingleType(_))
    }

    pub fn is_multi_type(&self) -> bool {
        matches!(self.kind, ResourceKind::MultiType(_))
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self.kind, ResourceKind::Untyped)
    }

    /// Replace the selector bindings wholesale. Any declared type is dropped;
    /// an empty map leaves the resource untyped. Nothing is merged.
    pub fn replace_bindings(self, bindings: TypedBindingMap) -> Self {
        let kind = match bindings.into_option() {
            Some(bindings) => ResourceKind::MultiType(bindings),
            None => ResourceKind::Untyped,
        };
        Self {
            path: self.path,
            kind,
        }
    }
}

impl fmt::Display for FileResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[derive(Debug, Clone)]
enum Location {
    Joined { directory: PathBuf, file_name: PathBuf },
    Full(PathBuf),
}

/// Collects a resource's configuration before it is published. `bindings`
/// and `declared_type` replace earlier calls; they never merge.
#[derive(Debug, Clone)]
pub struct FileResourceBuilder {
    location: Location,
    declared_type: Option<TypeDescriptor>,
    bindings: Option<TypedBindingMap>,
}

impl FileResourceBuilder {
    fn new(location: Location) -> Self {
        Self {
            location,
            declared_type: None,
            bindings: None,
        }
    }

    pub fn declared_type(mut self, declared_type: TypeDescriptor) -> Self {
        self.declared_type = Some(declared_type);
        self
    }

    pub fn bindings(mut self, bindings: TypedBindingMap) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn build(self) -> Result<FileResource, ResourceError> {
        let path = match self.location {
            Location::Joined {
                directory,
                file_name,
            } => {
                if is_blank(file_name.as_os_str()) {
                    return Err(ResourceError::invalid(
                        "file name",
                        "file name must not be empty",
                    ));
                }
                names_file("file name", directory.join(file_name))?
            }
            Location::Full(path) => {
                if is_blank(path.as_os_str()) {
                    return Err(ResourceError::invalid("path", "path must not be empty"));
                }
                names_file("path", path)?
            }
        };

        let kind = match (
            self.declared_type,
            self.bindings.and_then(TypedBindingMap::into_option),
        ) {
            (Some(_), Some(_)) => {
                return Err(ResourceError::invalid(
                    "declared type",
                    "a resource is either single-typed or bound by selectors, not both",
                ));
            }
            (Some(declared), None) => ResourceKind::SingleType(declared),
            (None, Some(bindings)) => ResourceKind::MultiType(bindings),
            (None, None) => ResourceKind::Untyped,
        };

        Ok(FileResource { path, kind })
    }
}

fn names_file(field: &'static str, path: PathBuf) -> Result<PathBuf, ResourceError> {
    if path.file_name().is_none() {
        return Err(ResourceError::invalid(
            field,
            format!("`{}` does not name a file", path.display()),
        ));
    }
    Ok(path)
}

fn is_blank(value: &OsStr) -> bool {
    value.is_empty() || value.to_str().is_some_and(|s| s.trim().is_empty())
}
