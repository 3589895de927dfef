//! Transient Render Target Ledger
//!
//! Temporary render targets live on the host and are addressed by
//! [`ShaderProperty`] ids. The ledger mirrors every allocation so the
//! pipeline can guarantee that each target is released within the camera
//! that allocated it.
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │               TransientTargets                    │
//! │                                                  │
//! │  live: FxHashMap<ShaderProperty, Desc>           │
//! │                                                  │
//! │  allocate(host, id, desc)  (during recording)    │
//! │  release(host, id)         (after last read)     │
//! │  release_all(host)         (end of camera)       │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Anything still live at [`TransientTargets::release_all`] is a leak: it is
//! released on the host and reported at warn level.

use rustc_hash::FxHashMap;

use super::host::{RenderHost, TemporaryTargetDesc};
use super::properties::ShaderProperty;

/// Ledger of temporary render targets allocated during the current camera.
#[derive(Debug, Default)]
pub struct TransientTargets {
    live: FxHashMap<ShaderProperty, TemporaryTargetDesc>,
    /// Highest number of simultaneously live targets since creation.
    peak: usize,
    /// Total allocations since creation.
    allocations: u64,
}

impl TransientTargets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a temporary target on the host.
    ///
    /// Re-allocating a live id first releases the old target.
    pub fn allocate(
        &mut self,
        host: &mut dyn RenderHost,
        id: ShaderProperty,
        desc: TemporaryTargetDesc,
    ) {
        if self.live.contains_key(&id) {
            log::warn!("TransientTargets: {id} allocated twice, releasing previous target");
            host.release_temporary_rt(id);
        }
        host.get_temporary_rt(id, &desc);
        self.live.insert(id, desc);
        self.allocations += 1;
        self.peak = self.peak.max(self.live.len());
    }

    /// Releases a temporary target. Unknown ids are ignored with a warning.
    pub fn release(&mut self, host: &mut dyn RenderHost, id: ShaderProperty) {
        if self.live.remove(&id).is_some() {
            host.release_temporary_rt(id);
        } else {
            log::warn!("TransientTargets: release of {id} which is not live, skipping");
        }
    }

    /// Releases every live target, returning how many leaked.
    pub fn release_all(&mut self, host: &mut dyn RenderHost) -> usize {
        let leaked = self.live.len();
        for (id, _) in self.live.drain() {
            log::warn!("TransientTargets: {id} leaked past end of camera, releasing");
            host.release_temporary_rt(id);
        }
        leaked
    }

    #[inline]
    #[must_use]
    pub fn is_live(&self, id: ShaderProperty) -> bool {
        self.live.contains_key(&id)
    }

    /// Descriptor of a live target.
    #[inline]
    #[must_use]
    pub fn desc(&self, id: ShaderProperty) -> Option<&TemporaryTargetDesc> {
        self.live.get(&id)
    }

    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[inline]
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak
    }

    #[inline]
    #[must_use]
    pub fn allocations(&self) -> u64 {
        self.allocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::RecordingHost;

    #[test]
    fn release_all_reports_and_frees_leaks() {
        let mut host = RecordingHost::new();
        let mut targets = TransientTargets::new();
        let a = ShaderProperty::new("_LedgerA");
        let b = ShaderProperty::new("_LedgerB");

        targets.allocate(&mut host, a, TemporaryTargetDesc::depth(4, 4));
        targets.allocate(&mut host, b, TemporaryTargetDesc::depth(4, 4));
        targets.release(&mut host, a);
        assert_eq!(targets.peak(), 2);

        assert_eq!(targets.release_all(&mut host), 1);
        assert_eq!(targets.live_count(), 0);
        assert!(host.live_temporaries().is_empty());
    }

    #[test]
    fn double_allocation_replaces_previous_target() {
        let mut host = RecordingHost::new();
        let mut targets = TransientTargets::new();
        let id = ShaderProperty::new("_LedgerTwice");

        targets.allocate(&mut host, id, TemporaryTargetDesc::depth(2, 2));
        targets.allocate(&mut host, id, TemporaryTargetDesc::depth(8, 8));

        assert_eq!(targets.live_count(), 1);
        assert_eq!(targets.desc(id).map(|d| d.width), Some(8));
        assert_eq!(host.live_temporaries().len(), 1);
    }
}
