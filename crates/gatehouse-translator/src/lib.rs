//! Translation of gateway resources and attached policies into IR
//!
//! - **IR**: per-target proxy configuration bundles and proxy fleet shapes
//! - **Patch**: compiles ProxyPatchPolicy patches into IR records
//! - **Status**: writes the `Accepted` condition onto policies
//! - **Translator**: attaches policies to their targets
//!
//! A pass is a pure function of its inputs apart from the status written
//! onto the policies it was handed.

#![deny(missing_docs)]

pub mod ir;
pub mod patch;
pub mod status;
pub mod translator;

pub use translator::{PolicyOutcome, TargetMode, Translator, TranslatorConfig};
