//! Localization table formats written into the bundle.

pub mod strings;

pub use strings::{Format as StringsFormat, Pair};
