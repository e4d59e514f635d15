//! User-facing messages attached to resolved attempts.
//!
//! These strings are shown on the UI, printed on receipts and stored in the
//! audit log, so they are part of the observable contract of the appliance.

/// Messages for resolved authentication attempts.
///
/// # Usage
///
/// ```
/// use badgegate_core::AttemptMessages;
///
/// assert_eq!(AttemptMessages::ACCESS_GRANTED, "Access granted");
/// ```
pub struct AttemptMessages;

impl AttemptMessages {
    /// Card and PIN matched an enrolled credential.
    pub const ACCESS_GRANTED: &'static str = "Access granted";

    /// Card and PIN did not match.
    pub const INVALID_PIN: &'static str = "Invalid PIN";

    /// The credential store could not answer (error or timeout).
    ///
    /// Kept distinct from [`Self::INVALID_PIN`] so the audit trail can tell a
    /// wrong PIN apart from an outage.
    pub const VERIFICATION_UNAVAILABLE: &'static str = "Verification unavailable";
}
