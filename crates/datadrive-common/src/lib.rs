pub mod address;
pub mod decode;
pub mod value;

pub use address::*;
pub use decode::*;
pub use value::*;
