//! Low-level building blocks for custom matching pipelines.
//!
//! These expose the correlation kernels, the resample filter behind
//! fingerprints, and the correlation plan. Most users should prefer
//! [`crate::MatchEngine`].

pub use crate::image::resample::resample_box;
pub use crate::kernel::scalar::NccScalar;
pub use crate::kernel::{Correlation, Kernel, Position};
pub use crate::template::TemplatePlan;

#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::NccRayon;
