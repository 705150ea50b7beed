//! Transmission policies and update results.

/// How a synchronized value moves over its link.
///
/// Two independent switches fall out of the policy: whether the periodic
/// transmit timer runs, and whether a local change transmits immediately.
/// Reception is registered under every policy; only `RxEcho` retransmits
/// what it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxTxPolicy {
    /// Transmit on a fixed period; local changes wait for the timer.
    TxPeriodic,
    /// Transmit immediately on local change.
    TxOnChange,
    /// Transmit immediately on local change, plus a periodic heartbeat.
    TxOnChangeWithHeartbeat,
    /// Never transmit; accept remote updates.
    RxOnly,
    /// Never transmit on local change; retransmit every accepted receipt.
    RxEcho,
}

impl RxTxPolicy {
    /// Whether the periodic transmit timer runs under this policy.
    pub const fn periodic_tx(self) -> bool {
        matches!(self, RxTxPolicy::TxPeriodic | RxTxPolicy::TxOnChangeWithHeartbeat)
    }

    /// Whether a changed local value triggers an immediate transmit attempt.
    pub const fn tx_on_change(self) -> bool {
        matches!(self, RxTxPolicy::TxOnChange | RxTxPolicy::TxOnChangeWithHeartbeat)
    }

    /// Whether an accepted receipt is copied back out and retransmitted.
    pub const fn echo(self) -> bool {
        matches!(self, RxTxPolicy::RxEcho)
    }
}

/// When an outbound value becomes the authoritative local value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Commit the staged value once its transmit is enqueued.
    OnTransmit,
    /// Commit only when the value comes back over the link.
    OnReceive,
}

/// Result of any attempted write, local or remote.
///
/// A write is applied only when the value actually changed and passed
/// validation; on rejection the prior value is retained unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateStatus {
    /// The new value differed from the stored value.
    pub value_changed: bool,
    /// The new value passed the configured validator.
    pub valid_value: bool,
    /// Both of the above held, so the write proceeded.
    pub update_allowed: bool,
    /// The buffer was updated and callbacks ran.
    pub update_successful: bool,
}

impl UpdateStatus {
    /// A rejected update that never got past comparison or validation.
    pub const fn rejected() -> Self {
        Self {
            value_changed: false,
            valid_value: false,
            update_allowed: false,
            update_successful: false,
        }
    }
}
