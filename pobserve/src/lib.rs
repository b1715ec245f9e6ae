//! Production-friendly observability hooks for dialog, validator, and collaborator phases.
//!
//! ```rust
//! use pobserve::{MetricsObservabilityHooks, SafeDialogHooks, TracingObservabilityHooks};
//!
//! let _dialog_hooks = SafeDialogHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeDialogHooks, SafeServiceHooks, SafeValidatorHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeDialogHooks, SafeServiceHooks, SafeValidatorHooks,
        TracingObservabilityHooks,
    };
}
