//! Mood signal registry.
//!
//! A mood signal is an anonymous, self-reported academic/emotional state tag
//! ("Deadline Mode", "Resetting", ...) used to group students for matching.
//! The catalog is fixed at process start and never mutated.
//!
//! Lookups of unknown ids fail with [`MoodError::UnknownMoodSignal`], but the
//! session layer never propagates that error: [`MoodRegistry::resolve_or_default`]
//! falls back to the first catalog entry so that session creation cannot fail
//! on a stale or mistyped id.

use serde::Serialize;

use crate::error::MoodError;

/// Immutable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MoodSignal {
    /// Unique identifier (e.g. `deadline_mode`).
    pub id: &'static str,
    /// Human readable label.
    pub label: &'static str,
    /// Display glyph.
    pub icon: &'static str,
    /// Number of students currently reporting this signal.
    pub report_count: u32,
}

const CAMPUS_SIGNALS: [MoodSignal; 6] = [
    MoodSignal { id: "heavy_load", label: "Heavy Academic Load", icon: "⚖️", report_count: 312 },
    MoodSignal { id: "deadline_mode", label: "Deadline Mode", icon: "⏳", report_count: 245 },
    MoodSignal { id: "catching_up", label: "Catching Up", icon: "🏃", report_count: 184 },
    MoodSignal { id: "steady_pace", label: "Steady Pace", icon: "🚶", report_count: 98 },
    MoodSignal { id: "collaborating", label: "Group Work", icon: "🤝", report_count: 156 },
    MoodSignal { id: "resetting", label: "Resetting", icon: "🔋", report_count: 112 },
];

/// Read-only catalog of mood signals.
///
/// Always holds at least one entry; the first entry is the default used for
/// unknown ids.
#[derive(Debug, Clone)]
pub struct MoodRegistry {
    signals: Vec<MoodSignal>,
}

impl Default for MoodRegistry {
    fn default() -> Self {
        Self::campus()
    }
}

impl MoodRegistry {
    /// The built-in campus catalog.
    pub fn campus() -> Self {
        Self { signals: CAMPUS_SIGNALS.to_vec() }
    }

    /// Build a registry from a custom catalog.
    ///
    /// # Errors
    ///
    /// - `MoodError::EmptyCatalog` if `signals` is empty
    /// - `MoodError::DuplicateId` if two entries share an id
    pub fn with_signals(signals: Vec<MoodSignal>) -> Result<Self, MoodError> {
        if signals.is_empty() {
            return Err(MoodError::EmptyCatalog);
        }
        for (i, signal) in signals.iter().enumerate() {
            if signals[..i].iter().any(|s| s.id == signal.id) {
                return Err(MoodError::DuplicateId(signal.id.to_string()));
            }
        }
        Ok(Self { signals })
    }

    /// Look up a signal by id.
    pub fn lookup(&self, id: &str) -> Result<&MoodSignal, MoodError> {
        self.signals
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| MoodError::UnknownMoodSignal(id.to_string()))
    }

    /// Look up a signal, falling back to [`Self::default_signal`] when the id
    /// is unknown.
    pub fn resolve_or_default(&self, id: &str) -> MoodSignal {
        match self.lookup(id) {
            Ok(signal) => *signal,
            Err(err) => {
                let fallback = self.default_signal();
                tracing::warn!(%err, fallback = fallback.id, "unknown mood signal, using default");
                fallback
            },
        }
    }

    /// First catalog entry.
    pub fn default_signal(&self) -> MoodSignal {
        // Constructors reject empty catalogs
        self.signals.first().copied().unwrap_or(CAMPUS_SIGNALS[0])
    }

    /// Signal with the highest report count. Ties go to the earlier entry.
    pub fn dominant(&self) -> MoodSignal {
        self.signals
            .iter()
            .fold(None::<&MoodSignal>, |best, s| match best {
                Some(b) if b.report_count >= s.report_count => Some(b),
                _ => Some(s),
            })
            .copied()
            .unwrap_or_else(|| self.default_signal())
    }

    /// All signals in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &MoodSignal> + Clone {
        self.signals.iter()
    }

    /// Number of signals in the catalog.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_signal() {
        let registry = MoodRegistry::campus();
        let signal = registry.lookup("deadline_mode").unwrap();
        assert_eq!(signal.label, "Deadline Mode");
        assert_eq!(signal.report_count, 245);
    }

    #[test]
    fn lookup_unknown_signal_fails() {
        let registry = MoodRegistry::campus();
        assert_eq!(
            registry.lookup("panicking"),
            Err(MoodError::UnknownMoodSignal("panicking".to_string()))
        );
    }

    #[test]
    fn unknown_signal_resolves_to_first_entry() {
        let registry = MoodRegistry::campus();
        assert_eq!(registry.resolve_or_default("nope").id, "heavy_load");
        assert_eq!(registry.resolve_or_default("").id, "heavy_load");
    }

    #[test]
    fn dominant_signal_has_most_reports() {
        let registry = MoodRegistry::campus();
        assert_eq!(registry.dominant().id, "heavy_load");
    }

    #[test]
    fn custom_catalog_validation() {
        assert_eq!(MoodRegistry::with_signals(vec![]).unwrap_err(), MoodError::EmptyCatalog);

        let dup = MoodSignal { id: "a", label: "A", icon: "*", report_count: 1 };
        assert_eq!(
            MoodRegistry::with_signals(vec![dup, dup]).unwrap_err(),
            MoodError::DuplicateId("a".to_string())
        );

        let registry = MoodRegistry::with_signals(vec![dup]).unwrap();
        assert_eq!(registry.default_signal(), dup);
    }

    #[test]
    fn catalog_listing() {
        let registry = MoodRegistry::campus();
        let listing: Vec<String> =
            registry.iter().map(|s| format!("{} {} ({})", s.id, s.label, s.report_count)).collect();
        insta::assert_snapshot!(listing.join("\n"), @r"
        heavy_load Heavy Academic Load (312)
        deadline_mode Deadline Mode (245)
        catching_up Catching Up (184)
        steady_pace Steady Pace (98)
        collaborating Group Work (156)
        resetting Resetting (112)
        ");
    }
}
