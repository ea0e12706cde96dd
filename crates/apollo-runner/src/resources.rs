//! Kubernetes-style resource unit translation for the batch backend.
//!
//! `cpu` is either a bare core count (`"1"`) or millicores (`"500m"`);
//! `memory` is `<n>Mi` or `<n>Gi`. The local backend passes the strings
//! through to docker untouched; the cloud backend needs millicores and
//! mebibytes.

/// Parse a CPU string into millicores. Unknown forms fall back to one core.
pub fn parse_cpu_millis(cpu: &str) -> i64 {
    if let Some(millis) = cpu.strip_suffix('m') {
        if let Ok(v) = millis.parse::<i64>() {
            return v;
        }
    }
    if let Ok(cores) = cpu.parse::<i64>() {
        return cores * 1000;
    }
    1000
}

/// Parse a memory string into MiB. Unknown forms fall back to 512 MiB.
pub fn parse_memory_mib(memory: &str) -> i64 {
    let upper = memory.to_uppercase();
    if let Some(gib) = upper.strip_suffix("GI") {
        if let Ok(v) = gib.parse::<i64>() {
            return v * 1024;
        }
    }
    if let Some(mib) = upper.strip_suffix("MI") {
        if let Ok(v) = mib.parse::<i64>() {
            return v;
        }
    }
    512
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_cores_become_millicores() {
        assert_eq!(parse_cpu_millis("1"), 1000);
        assert_eq!(parse_cpu_millis("4"), 4000);
    }

    #[test]
    fn cpu_millicores_pass_through() {
        assert_eq!(parse_cpu_millis("500m"), 500);
        assert_eq!(parse_cpu_millis("250m"), 250);
    }

    #[test]
    fn cpu_unknown_forms_default_to_one_core() {
        assert_eq!(parse_cpu_millis(""), 1000);
        assert_eq!(parse_cpu_millis("lots"), 1000);
        assert_eq!(parse_cpu_millis("1.5"), 1000);
    }

    #[test]
    fn memory_gib_becomes_mib() {
        assert_eq!(parse_memory_mib("1Gi"), 1024);
        assert_eq!(parse_memory_mib("2Gi"), 2048);
    }

    #[test]
    fn memory_mib_passes_through() {
        assert_eq!(parse_memory_mib("512Mi"), 512);
        assert_eq!(parse_memory_mib("256Mi"), 256);
    }

    #[test]
    fn memory_is_case_insensitive() {
        assert_eq!(parse_memory_mib("1gi"), 1024);
        assert_eq!(parse_memory_mib("512mi"), 512);
    }

    #[test]
    fn memory_unknown_forms_default() {
        assert_eq!(parse_memory_mib(""), 512);
        assert_eq!(parse_memory_mib("1G"), 512);
        assert_eq!(parse_memory_mib("plenty"), 512);
    }
}
