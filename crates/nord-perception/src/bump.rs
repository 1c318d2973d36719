//! Bump detection.
//!
//! Compares the compensated acceleration of the current sample against the
//! previous one. When the magnitude of the jump exceeds the threshold a
//! [`BumpEvent`] carrying the deltas is produced:
//!
//! ```text
//! Δf = a.forward − last.forward
//! Δu = a.up      − last.up
//! bump  ⇔  √(Δf² + Δu²) > threshold
//! ```
//!
//! The lateral axis is excluded from the magnitude unless
//! [`BumpAxes::ForwardUpRight`] is selected.
//!
//! The history is overwritten with the current reading on every call,
//! whether or not a bump fired. It starts at zero, so the very first sample
//! is compared against a robot at rest; a first reading whose compensated
//! magnitude already exceeds the threshold reports a bump.

use nord_types::{BumpEvent, Vector3};

/// Default jump magnitude (m/s²) above which a bump fires.
pub const DEFAULT_BUMP_THRESHOLD: f64 = 6.0;

/// Which compensated-acceleration axes contribute to the jump magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BumpAxes {
    /// Forward and up only.
    #[default]
    ForwardUp,
    /// Forward, up and the lateral (right) axis.
    ForwardUpRight,
}

/// The previous compensated acceleration reading.
///
/// One instance per physical sensor stream. Sharing a history between
/// streams mixes their deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BumpHistory {
    pub forward: f64,
    pub up: f64,
    /// Only consulted with [`BumpAxes::ForwardUpRight`], but always tracked
    /// so the axis selection can change without a stale baseline.
    pub right: f64,
}

impl BumpHistory {
    /// A zeroed history, as before the first sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `current` against the stored reading, then store `current`.
    pub fn detect(
        &mut self,
        current: &Vector3,
        threshold: f64,
        axes: BumpAxes,
    ) -> Option<BumpEvent> {
        let dx = current.forward - self.forward;
        let dy = current.up - self.up;
        let dr = current.right - self.right;

        let magnitude = match axes {
            BumpAxes::ForwardUp => (dx * dx + dy * dy).sqrt(),
            BumpAxes::ForwardUpRight => (dx * dx + dy * dy + dr * dr).sqrt(),
        };

        let event = (magnitude > threshold).then(|| BumpEvent {
            x: dx,
            y: dy,
            lateral: match axes {
                BumpAxes::ForwardUp => None,
                BumpAxes::ForwardUpRight => Some(dr),
            },
        });

        self.forward = current.forward;
        self.up = current.up;
        self.right = current.right;

        event
    }
}
