//! Deployment environment probe

use justice_domain::{CLOUD_INDICATORS, DeploymentSignals};

/// Observe deployment signals through `lookup`.
///
/// An indicator counts when its variable is set to anything non-empty.
pub fn probe_signals(debug: bool, lookup: &dyn Fn(&str) -> Option<String>) -> DeploymentSignals {
    let cloud_indicators = CLOUD_INDICATORS
        .iter()
        .filter(|name| lookup(name).is_some_and(|v| !v.trim().is_empty()))
        .map(|name| name.to_string())
        .collect();
    DeploymentSignals {
        cloud_indicators,
        debug,
    }
}

/// Read an environment variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_indicators() {
        let signals = probe_signals(true, &|_| None);
        assert!(!signals.is_cloud());
        assert!(!signals.is_production());
    }

    #[test]
    fn test_detects_indicators_in_order() {
        let lookup = |name: &str| match name {
            "PORT" => Some("8000".to_string()),
            "RENDER" => Some("true".to_string()),
            "VERCEL" => Some(String::new()),
            _ => None,
        };
        let signals = probe_signals(true, &lookup);
        assert_eq!(signals.cloud_indicators, vec!["PORT", "RENDER"]);
        assert!(signals.is_production());
    }

    #[test]
    fn test_debug_disabled_is_production() {
        assert!(probe_signals(false, &|_| None).is_production());
    }
}
