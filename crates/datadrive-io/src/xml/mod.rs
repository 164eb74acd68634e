mod document;
mod xpath;

pub use document::{Node, NodeId, XmlDocument};
pub use xpath::XPath;
