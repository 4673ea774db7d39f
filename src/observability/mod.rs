//! Crash reporting and run context.
//!
//! ```ignore
//! use corpuslens::observability::install_panic_hook;
//!
//! fn main() {
//!     install_panic_hook();
//!     // ... rest of application
//! }
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    enter_module, enter_resource, get_current_context, get_progress, increment_completed, reset_context,
    set_phase, set_profile, set_progress, ContextGuard, RunContext,
};
pub use panic_hook::install_panic_hook;
