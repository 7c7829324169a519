//! Duration/capacity filter.

use adpod_core::{AdPodSlot, Candidate};

/// Whether a candidate's duration can be placed in the slot's pod.
///
/// Live/DVR candidates (duration <= 0) never fit. Exact slots require the
/// duration to be one of the declared range values; other slots only
/// require it to fit the total capacity.
pub fn fits_slot(candidate: &Candidate, slot: &AdPodSlot) -> bool {
    let duration = candidate.duration_seconds;
    if duration <= 0 {
        return false;
    }
    if slot.require_exact_duration {
        slot.duration_range_seconds
            .iter()
            .any(|&r| i64::from(r) == duration)
    } else {
        duration <= i64::from(slot.total_duration_seconds)
    }
}
