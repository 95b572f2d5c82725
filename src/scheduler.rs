pub(crate) mod cadence;
pub mod daemon;
pub(crate) mod escalation;
