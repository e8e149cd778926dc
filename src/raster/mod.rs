//! Low-level pixel kernels shared by the shadow, compositor, and text stages.

pub(crate) mod blend;
pub(crate) mod blur;
