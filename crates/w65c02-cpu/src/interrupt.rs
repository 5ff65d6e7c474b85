//! Interrupt request aggregation and priority arbitration.

use std::collections::HashSet;

use crate::bus::vectors;
use crate::error::InvalidStateError;

/// Which interrupt line was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    /// RESET: highest priority, unmaskable.
    Reset,
    /// NMI: edge-triggered, unmaskable.
    Nmi,
    /// IRQ: level-triggered, masked by `P.I`.
    Irq,
}

/// Everything the CPU's interrupt sequencer needs to enter service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorInfo {
    /// Which line was serviced.
    pub kind: InterruptKind,
    /// Address of the little-endian vector to load PC from.
    pub vector_addr: u16,
    /// Master cycles the entry sequence consumes.
    pub base_cycles: u8,
}

/// Aggregates RESET/NMI/IRQ request state from arbitrary external sources
/// and arbitrates which one the CPU should service next.
///
/// Grounded on the original interrupt controller's edge/level bookkeeping:
/// NMI is latched on a rising edge and stays pending until acknowledged
/// regardless of how long the line is held high; IRQ is a simple
/// level/set-of-sources model; acknowledging IRQ clears every source
/// atomically rather than leaving them individually asserted (a documented
/// simplification — see crate docs).
#[derive(Debug, Default)]
pub struct InterruptController {
    irq_sources: HashSet<String>,
    nmi_pending: bool,
    nmi_line_high: bool,
    reset_pending: bool,
    servicing: Option<InterruptKind>,
}

impl InterruptController {
    /// Create a controller with no lines asserted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert IRQ from `source_id`. Level-triggered: IRQ stays pending as
    /// long as any source is present in the set.
    ///
    /// # Errors
    /// Returns [`InvalidStateError::EmptySourceId`] if `source_id` is empty.
    pub fn assert_irq(&mut self, source_id: &str) -> Result<(), InvalidStateError> {
        if source_id.is_empty() {
            return Err(InvalidStateError::EmptySourceId);
        }
        log::trace!("IRQ asserted by {source_id}");
        self.irq_sources.insert(source_id.to_string());
        Ok(())
    }

    /// Deassert IRQ from `source_id`.
    ///
    /// # Errors
    /// Returns [`InvalidStateError::EmptySourceId`] if `source_id` is empty.
    pub fn deassert_irq(&mut self, source_id: &str) -> Result<(), InvalidStateError> {
        if source_id.is_empty() {
            return Err(InvalidStateError::EmptySourceId);
        }
        log::trace!("IRQ deasserted by {source_id}");
        self.irq_sources.remove(source_id);
        Ok(())
    }

    /// Drive the NMI input high. Only a low→high transition latches a new
    /// pending NMI; holding the line high (or re-asserting without an
    /// intervening [`deassert_nmi`](Self::deassert_nmi)) has no further effect.
    pub fn assert_nmi(&mut self) {
        if !self.nmi_line_high {
            self.nmi_pending = true;
            log::trace!("NMI edge detected, latched pending");
        }
        self.nmi_line_high = true;
    }

    /// Drive the NMI input low. Re-arms edge detection but does not clear an
    /// already-latched pending NMI.
    pub fn deassert_nmi(&mut self) {
        self.nmi_line_high = false;
    }

    /// Assert the level-triggered RESET line.
    pub fn assert_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Deassert RESET.
    pub fn deassert_reset(&mut self) {
        self.reset_pending = false;
    }

    /// Whether any interrupt is currently pending, given the CPU's current
    /// `P.I` flag (`irq_enabled = !P.I`).
    #[must_use]
    pub fn is_pending(&self, irq_enabled: bool) -> bool {
        self.highest_priority_pending(irq_enabled).is_some()
    }

    /// Non-mutating priority query: RESET > NMI > (IRQ if enabled) > None.
    #[must_use]
    pub fn highest_priority_pending(&self, irq_enabled: bool) -> Option<InterruptKind> {
        if self.reset_pending {
            Some(InterruptKind::Reset)
        } else if self.nmi_pending {
            Some(InterruptKind::Nmi)
        } else if irq_enabled && !self.irq_sources.is_empty() {
            Some(InterruptKind::Irq)
        } else {
            None
        }
    }

    /// Select and atomically clear the highest-priority pending interrupt,
    /// returning vector information for the CPU's entry sequence.
    ///
    /// Acknowledging IRQ clears *all* sources in `irq_sources`, not just one
    /// — sources that still need servicing must re-assert, which matches
    /// how a shared IRQ line behaves on real hardware.
    pub fn acknowledge(&mut self, irq_enabled: bool) -> Option<VectorInfo> {
        let kind = self.highest_priority_pending(irq_enabled)?;
        match kind {
            InterruptKind::Reset => self.reset_pending = false,
            InterruptKind::Nmi => self.nmi_pending = false,
            InterruptKind::Irq => self.irq_sources.clear(),
        }
        self.servicing = Some(kind);
        log::debug!("acknowledged {kind:?}");
        let vector_addr = match kind {
            InterruptKind::Reset => vectors::RESET,
            InterruptKind::Nmi => vectors::NMI,
            InterruptKind::Irq => vectors::IRQ,
        };
        Some(VectorInfo { kind, vector_addr, base_cycles: 7 })
    }

    /// Called by the CPU's RTI executor once the return-from-interrupt
    /// sequence completes, clearing the informational `servicing` marker.
    pub fn complete_service(&mut self) {
        self.servicing = None;
    }

    /// The interrupt currently being serviced (entered but not yet RTI'd
    /// from), if any. Informational only; does not affect masking.
    #[must_use]
    pub fn servicing(&self) -> Option<InterruptKind> {
        self.servicing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_outranks_everything() {
        let mut ic = InterruptController::new();
        ic.assert_nmi();
        ic.assert_irq("dev").unwrap();
        ic.assert_reset();
        assert_eq!(ic.highest_priority_pending(true), Some(InterruptKind::Reset));
    }

    #[test]
    fn nmi_outranks_irq() {
        let mut ic = InterruptController::new();
        ic.assert_nmi();
        ic.assert_irq("dev").unwrap();
        assert_eq!(ic.highest_priority_pending(true), Some(InterruptKind::Nmi));
    }

    #[test]
    fn irq_masked_by_p_i() {
        let mut ic = InterruptController::new();
        ic.assert_irq("dev").unwrap();
        assert_eq!(ic.highest_priority_pending(false), None);
        assert_eq!(ic.highest_priority_pending(true), Some(InterruptKind::Irq));
    }

    #[test]
    fn nmi_edge_discipline() {
        let mut ic = InterruptController::new();
        ic.assert_nmi();
        assert!(ic.acknowledge(true).is_some());
        // Line still high, no intervening deassert: no second NMI latches.
        ic.assert_nmi();
        assert_eq!(ic.highest_priority_pending(true), None);
        // Deassert then reassert: a fresh edge latches.
        ic.deassert_nmi();
        ic.assert_nmi();
        assert_eq!(ic.highest_priority_pending(true), Some(InterruptKind::Nmi));
    }

    #[test]
    fn acknowledging_irq_clears_all_sources() {
        let mut ic = InterruptController::new();
        ic.assert_irq("a").unwrap();
        ic.assert_irq("b").unwrap();
        assert!(ic.acknowledge(true).is_some());
        assert_eq!(ic.highest_priority_pending(true), None);
    }

    #[test]
    fn empty_source_id_rejected() {
        let mut ic = InterruptController::new();
        assert_eq!(ic.assert_irq(""), Err(InvalidStateError::EmptySourceId));
    }

    #[test]
    fn servicing_tracks_until_completion() {
        let mut ic = InterruptController::new();
        ic.assert_irq("dev").unwrap();
        ic.acknowledge(true);
        assert_eq!(ic.servicing(), Some(InterruptKind::Irq));
        ic.complete_service();
        assert_eq!(ic.servicing(), None);
    }

    #[test]
    fn acknowledge_returns_correct_vector() {
        let mut ic = InterruptController::new();
        ic.assert_reset();
        let info = ic.acknowledge(true).unwrap();
        assert_eq!(info.vector_addr, vectors::RESET);
        assert_eq!(info.base_cycles, 7);
    }
}
