//! Document value types.

mod value;

pub use value::{Map, Value};
