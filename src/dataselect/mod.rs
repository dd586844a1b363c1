//! Generic data selection
//!
//! Filter, sort and paginate any collection whose elements expose their
//! fields through [`DataCell`].

pub mod query;
pub mod selector;
pub mod value;

pub use query::*;
pub use selector::select;
pub use value::*;
