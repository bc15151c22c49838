//! Bounding of the alert batch carried by one notification.

use crate::core::Alert;

/// Keeps at most `max_alerts` alerts, in caller order.
///
/// A maximum of 0 means unbounded. Returns the kept prefix and the number of
/// alerts dropped.
pub fn truncate_alerts(max_alerts: u64, alerts: &[Alert]) -> (&[Alert], u64) {
    let len = alerts.len() as u64;
    if max_alerts != 0 && len > max_alerts {
        // max_alerts < len, which fits in usize.
        (&alerts[..max_alerts as usize], len - max_alerts)
    } else {
        (alerts, 0)
    }
}
