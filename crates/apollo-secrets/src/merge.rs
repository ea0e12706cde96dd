//! Secret merging: provider view × operator declarations.
//!
//! The output contains exactly the secrets the operator declared in
//! `jobs.yml`, resolved in declaration order. A declared value containing
//! `$` is a reference: the provider's value for that name wins, then the
//! process environment, and an unresolvable reference is logged and
//! dropped. A value without `$` is taken literally. The runner layer
//! injects the returned set into every container it starts.

use std::collections::HashSet;

use apollo_core::{Secret, SecretConfig};
use tracing::warn;

/// Merge provider-supplied secrets with the config-declared list.
///
/// Deduplicates by name (first declaration wins) and preserves the
/// declaration order of `jobs.yml`.
pub fn merge_secrets(provider: &[Secret], declared: &[SecretConfig]) -> Vec<Secret> {
    let mut merged = Vec::with_capacity(declared.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(declared.len());

    for entry in declared {
        if !seen.insert(entry.name.as_str()) {
            continue;
        }

        if !entry.value.contains('$') {
            merged.push(Secret::new(entry.name.clone(), entry.value.clone()));
            continue;
        }

        // Reference: provider first, then the process environment.
        if let Some(s) = provider.iter().find(|s| s.key == entry.name) {
            merged.push(s.clone());
            continue;
        }

        let env_value = std::env::var(&entry.name).unwrap_or_default();
        if env_value.is_empty() {
            warn!(secret = %entry.name, "secret not found in provider or environment");
            continue;
        }
        merged.push(Secret::new(entry.name.clone(), env_value));
    }

    merged
}
