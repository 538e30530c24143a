//! Safety classification: tiers, categories, the classifier, and the rule
//! table that drives it.

pub mod category;
pub mod classifier;
pub mod rules;
pub mod tier;

pub use category::{Category, CleanupHint, DockerKind, Ide, PackageManager};
pub use classifier::{classify, Classification, ProbeInput, SafetyRule};
pub use tier::{CleanupLevel, SafetyTier};
