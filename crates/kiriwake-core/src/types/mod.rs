pub mod release;
pub mod tag;

pub use release::{Release, Type};
pub use tag::{Tag, TagType, Verb, find};
