use anyhow::Result;
use std::path::PathBuf;

use super::{build_registry, load_profile};
use crate::registry::ModuleOrigin;

pub fn handle_modules(profile: Option<PathBuf>, manifests: Vec<PathBuf>) -> Result<()> {
    let profile = load_profile(profile.as_deref())?;
    let (registry, report) = build_registry(&profile, &manifests, false);

    println!("Modules for profile '{}':", profile.code());
    for entry in registry.entries() {
        let origin = match entry.origin() {
            ModuleOrigin::BuiltIn => "built-in".to_string(),
            ModuleOrigin::Programmatic => "programmatic".to_string(),
            ModuleOrigin::Manifest { location } => location.display().to_string(),
        };
        let status = if !profile.modules().is_enabled(entry.name()) {
            "disabled".to_string()
        } else {
            match entry.instantiate(profile.clone()).can_run(&profile).reason() {
                None => "ready".to_string(),
                Some(reason) => format!("blocked ({reason})"),
            }
        };
        println!("  {:<16} {:<28} {}", entry.name(), status, origin);
    }

    for rejection in &report.rejected {
        println!(
            "  rejected {} from {}: {}",
            rejection.candidate.as_deref().unwrap_or("<manifest>"),
            rejection.location.display(),
            rejection.reason
        );
    }
    Ok(())
}
