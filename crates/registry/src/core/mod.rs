//! Shared registry infrastructure: type identity and the bidirectional lookup.

pub mod error;
pub mod key;
pub mod lookup;

pub use error::LookupError;
pub use key::TypeKey;
pub use lookup::{Transaction, TypeLookup};
