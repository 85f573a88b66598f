//! Config validation: unknown-key detection with "did you mean" suggestions.
//!
//! Two-pass parse approach: first deserialize the raw TOML into
//! `toml::Value`, walk the key tree, compare against the known field names,
//! and emit warnings with suggestions. Then proceed with normal serde
//! deserialization. Warnings never break a loadable config; missing required
//! fields still fail the serde pass.

use std::collections::HashSet;

/// A non-fatal config warning (typo, unrecognized key).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " — did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Complete set of valid dotted key paths for `PumpConfig`.
///
/// Maintained manually to match the struct hierarchy in `config/mod.rs`.
/// Any new field added there must be added here too.
pub fn known_config_keys() -> HashSet<String> {
    let mut keys: HashSet<String> = [
        // [monitor]
        "monitor",
        "monitor.name",
        "monitor.site",
        // [engine]
        "engine",
        "engine.window_size",
        "engine.min_samples",
        "engine.max_gap_secs",
        "engine.trend_epsilon",
        "engine.trend_min_confidence",
        "engine.elevated_fraction",
        // [hysteresis]
        "hysteresis",
        "hysteresis.upgrade",
        "hysteresis.downgrade",
        // [emitter]
        "emitter",
        "emitter.heartbeat_secs",
        "emitter.queue_capacity",
        // [advisory]
        "advisory",
        "advisory.fail_urgency_hours",
        "advisory.warning_urgency_hours",
        "advisory.healthy_urgency_hours",
        // [signals]
        "signals",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();

    // Per-signal tables share one field set.
    const SIGNALS: [&str; 3] = ["vibration", "motor_current", "temperature"];
    const FIELDS: [&str; 6] = [
        "plausible_min",
        "plausible_max",
        "healthy_min",
        "healthy_max",
        "warning_over",
        "fail_over",
    ];
    for signal in SIGNALS {
        keys.insert(format!("signals.{signal}"));
        for field in FIELDS {
            keys.insert(format!("signals.{signal}.{field}"));
        }
    }
    keys
}

// ============================================================================
// Key Walking & Matching
// ============================================================================

/// Collect every dotted key path present in a TOML value tree.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let toml::Value::Table(table) = value {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            keys.extend(walk_toml_keys(v, &path));
        }
    }
    keys
}

/// Check raw TOML contents for keys not in the known set.
///
/// Returns one warning per unknown key, with a closest-match suggestion when
/// a known key is within edit distance 3.
pub fn validate_unknown_keys(contents: &str) -> Vec<ValidationWarning> {
    let Ok(value) = contents.parse::<toml::Value>() else {
        // Unparseable TOML is reported by the serde pass with a better error.
        return Vec::new();
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if known.contains(key.as_str()) {
            continue;
        }
        let suggestion = known
            .iter()
            .map(|k| (k.as_str(), levenshtein(&key, k)))
            .filter(|(_, d)| *d <= 3)
            .min_by_key(|(_, d)| *d)
            .map(|(k, _)| k.to_string());
        warnings.push(ValidationWarning {
            field: key.clone(),
            message: format!("unknown config key '{key}'"),
            suggestion,
        });
    }
    warnings
}

/// Edit distance between two keys, for typo suggestions.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
