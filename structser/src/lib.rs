//! Positional binary encoding for structured fuzz inputs.
//!
//! Every supported type implements [`Serializable`], [`DefaultValue`] and [`Equatable`].
//! Decoding is total: a buffer that is too short decodes as if it were padded with zeros,
//! which for every built-in category is the encoding of the default value.

pub mod default;
pub mod equality;
pub mod reader;
pub mod serialize;
pub mod set;

pub use default::DefaultValue;
pub use equality::Equatable;
pub use reader::Reader;
pub use serialize::{decode, deepest, encode, Serializable, MAX_SEQUENCE_LEN};
pub use set::{EnumSet, Enumeration};
