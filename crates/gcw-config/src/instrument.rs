//! Code generation choices.

use gcw_core::{AccessPolicy, CallStyle, ClosureStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstrumentConfig {
    /// `public` or `restricted` (protected plus friends).
    #[serde(default)]
    pub access: AccessPolicy,

    /// `direct` member calls or `dispatch` through the helper templates.
    #[serde(default)]
    pub call_style: CallStyle,

    /// `fixed-point` or `two-pass` closure computation.
    #[serde(default)]
    pub closure: ClosureStrategy,

    /// Class annotation that opts a class into collection (e.g., `gc::Trace`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_annotation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = InstrumentConfig::default();
        assert_eq!(config.access, AccessPolicy::Public);
        assert_eq!(config.call_style, CallStyle::Direct);
        assert_eq!(config.closure, ClosureStrategy::FixedPoint);
        assert!(config.trace_annotation.is_none());
    }
}
