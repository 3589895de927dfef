//! Per-camera recording context.

use super::host::{RenderHost, TemporaryTargetDesc};
use super::properties::ShaderProperty;
use super::transient::TransientTargets;

/// The host plus the transient-target ledger for the camera being recorded.
///
/// Every component that allocates temporaries goes through this context so
/// the ledger sees each allocation and release.
pub struct FrameContext<'a> {
    pub host: &'a mut dyn RenderHost,
    pub targets: &'a mut TransientTargets,
}

impl<'a> FrameContext<'a> {
    pub fn new(host: &'a mut dyn RenderHost, targets: &'a mut TransientTargets) -> Self {
        Self { host, targets }
    }

    #[inline]
    pub fn get_temporary(&mut self, id: ShaderProperty, desc: TemporaryTargetDesc) {
        self.targets.allocate(&mut *self.host, id, desc);
    }

    #[inline]
    pub fn release_temporary(&mut self, id: ShaderProperty) {
        self.targets.release(&mut *self.host, id);
    }

    /// Releases anything still live; returns the leak count.
    #[inline]
    pub fn release_leaked(&mut self) -> usize {
        self.targets.release_all(&mut *self.host)
    }
}
