//! Resource model for data-driven test providers.
//!
//! A [`FileResource`] names the file a provider should read and what the
//! content binds to: either one declared type for the whole file, or a
//! [`TypedBindingMap`] that maps selectors (XPath expressions, sheet locators,
//! JSON pointers) to independent target types. Providers consume resources
//! read-only; nothing here performs I/O.

mod binding;
mod descriptor;
mod error;
mod resource;

pub use binding::{Selector, TypedBindingMap};
pub use descriptor::{BoundValue, TypeDescriptor};
pub use error::ResourceError;
pub use resource::{FileResource, FileResourceBuilder, ResourceKind};
