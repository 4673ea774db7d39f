//! Panic hook producing structured crash reports.
//!
//! Panics raised by analysis modules are caught by the executor and
//! recorded as module failures, and panics raised by resource loaders are
//! recorded as absent resources; for those the hook only logs a single
//! line. Any other panic prints a crash report with the run context.

use super::context::{get_current_context, get_progress, RunContext};
use std::panic::PanicHookInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "════════════════════════════════════════════════════════════════════════";

/// Install the custom panic hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let context = get_current_context();
        if context.isolated {
            log_isolated_panic(info, &context);
        } else {
            print_crash_report(info, &context);
        }
    }));
}

fn log_isolated_panic(info: &PanicHookInfo<'_>, context: &RunContext) {
    if let Some(resource) = &context.current_resource {
        tracing::error!(
            resource = %resource,
            location = %location(info),
            "resource loader panicked: {}",
            extract_panic_message(info)
        );
        return;
    }
    tracing::error!(
        module = context.current_module.as_deref().unwrap_or("<unknown>"),
        location = %location(info),
        "module panicked: {}",
        extract_panic_message(info)
    );
}

fn print_crash_report(info: &PanicHookInfo<'_>, context: &RunContext) {
    let (completed, total) = get_progress();
    eprintln!();
    eprintln!("{RULE}");
    eprintln!("  CORPUSLENS CRASH REPORT");
    eprintln!("  Version: {VERSION}");
    eprintln!("  Platform: {}", std::env::consts::OS);
    eprintln!("  Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    eprintln!("{RULE}");
    eprintln!("  PANIC: {}", truncate(&extract_panic_message(info), 200));
    eprintln!("  Location: {}", location(info));
    match &context.phase {
        Some(phase) => eprintln!("  Phase: {phase}"),
        None => eprintln!("  Phase: (not set - crash occurred before any run started)"),
    }
    if let Some(profile) = &context.profile {
        eprintln!("  Profile: {profile}");
    }
    if total > 0 {
        eprintln!("  Modules: {completed} / {total} completed");
    }
    if std::env::var("RUST_BACKTRACE").is_ok() {
        eprintln!("{RULE}");
        eprintln!("{}", std::backtrace::Backtrace::capture());
    } else {
        eprintln!("  Run with RUST_BACKTRACE=1 for stack trace");
    }
    eprintln!("{RULE}");
}

fn location(info: &PanicHookInfo<'_>) -> String {
    info.location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "<unknown>".to_string())
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    crate::pipeline::panic_message(info.payload())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_long_string_on_char_boundary() {
        assert_eq!(truncate("éééééééééé", 6), "ééé...");
    }
}
