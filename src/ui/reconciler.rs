//! Settings Reconciler
//!
//! A draft state machine over two independently-owned configuration
//! domains: server-authoritative `DefenseThresholds` and client-resident
//! `ScenarioDefaults`. Opening the panel copies the session scenario
//! defaults into the draft and starts a thresholds fetch tagged with an
//! open-epoch token; only the fetch matching the current epoch may
//! populate the draft, so a stale response from a superseded `open()`
//! (rapid toggle, close-and-reopen) is dropped.
//!
//! The save is deliberately not atomic across the two domains: the defense
//! write goes to the server best-effort while the scenario commit is local.
//! A failed defense write still closes the panel (its error is surfaced
//! inline); only a failed local commit keeps the panel open.
//!
//! This module is UI-free; `ui::settings` renders it.

use crate::error::ApiError;
use crate::models::{DefenseThresholds, ScenarioDefaults, SimType};

/// Editable fields of the defense thresholds domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefenseField {
    BruteThreshold,
    BruteWindow,
    GeohopThreshold,
    CredThreshold,
    CredWindow,
}

/// Editable fields of one scenario's generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioField {
    Delay,
    Iterations,
    FailureRate,
    Workers,
}

/// Transient editable copy of both configuration domains.
/// Lifecycle: open -> populate -> edit -> {save|cancel} -> destroy.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDraft {
    pub defense: DefenseThresholds,
    pub scenarios: ScenarioDefaults,
}

/// Result of a `save_all` attempt. Both variants carry the defense payload
/// because the server write is attempted regardless of the local commit.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Scenario defaults committed; panel closed.
    Committed { defense: DefenseThresholds },
    /// Local scenario commit failed; panel stays open, both errors shown.
    CommitFailed { defense: DefenseThresholds },
    /// No draft is open.
    NotOpen,
}

/// Coerce raw text to an integer field value. Invalid input becomes the
/// zero sentinel; the server stays the authority on acceptable ranges.
pub fn coerce_int(raw: &str) -> i64 {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f as i64)
        })
        .unwrap_or(0)
}

/// Coerce raw text to a float field value. Non-finite results (NaN, inf)
/// are rejected to the zero sentinel so the save payload stays
/// serializable.
pub fn coerce_float(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// The reconciler itself: panel visibility, the draft, the open-epoch
/// fetch guard and the per-domain inline errors.
pub struct SettingsReconciler {
    open_epoch: u64,
    panel_open: bool,
    draft: Option<SettingsDraft>,
    /// Last server copy of the thresholds we have seen; seeds the draft
    /// while a fresh fetch is in flight or after it failed.
    last_defense: DefenseThresholds,
    defense_error: Option<String>,
    scenario_error: Option<String>,
}

impl Default for SettingsReconciler {
    fn default() -> Self {
        Self {
            open_epoch: 0,
            panel_open: false,
            draft: None,
            last_defense: DefenseThresholds::default(),
            defense_error: None,
            scenario_error: None,
        }
    }
}

impl SettingsReconciler {
    /// Open the panel: snapshot-copy the session scenario defaults into the
    /// draft, seed the defense section with the last known server copy and
    /// return the epoch token the caller must tag its thresholds fetch
    /// with. A lingering defense error stays visible until the re-fetch
    /// succeeds.
    pub fn open(&mut self, session: &ScenarioDefaults) -> u64 {
        self.open_epoch += 1;
        self.panel_open = true;
        self.scenario_error = None;
        self.draft = Some(SettingsDraft {
            defense: self.last_defense,
            scenarios: *session,
        });
        self.open_epoch
    }

    /// Apply the result of a thresholds fetch. Returns false if the result
    /// was stale (panel closed, or a newer `open()` superseded the fetch)
    /// and was dropped.
    pub fn apply_defense_fetch(
        &mut self,
        token: u64,
        result: Result<DefenseThresholds, ApiError>,
    ) -> bool {
        if !self.panel_open || token != self.open_epoch {
            return false;
        }
        match result {
            Ok(thresholds) => {
                self.last_defense = thresholds;
                if let Some(draft) = self.draft.as_mut() {
                    draft.defense = thresholds;
                }
                self.defense_error = None;
            }
            Err(e) => {
                // Draft keeps its previous defense values; the panel stays
                // usable for the scenario section.
                self.defense_error = Some(e.user_message());
            }
        }
        true
    }

    /// Draft mutation: numeric coercion only, no range validation.
    pub fn edit_defense(&mut self, field: DefenseField, raw: &str) {
        if let Some(draft) = self.draft.as_mut() {
            let value = coerce_int(raw);
            match field {
                DefenseField::BruteThreshold => draft.defense.brute_threshold = value,
                DefenseField::BruteWindow => draft.defense.brute_window = value,
                DefenseField::GeohopThreshold => draft.defense.geohop_threshold = value,
                DefenseField::CredThreshold => draft.defense.cred_threshold = value,
                DefenseField::CredWindow => draft.defense.cred_window = value,
            }
        }
    }

    /// Draft mutation for one scenario's parameters.
    pub fn edit_scenario(&mut self, kind: SimType, field: ScenarioField, raw: &str) {
        if let Some(draft) = self.draft.as_mut() {
            let params = draft.scenarios.get_mut(kind);
            match field {
                ScenarioField::Delay => params.delay = coerce_float(raw),
                ScenarioField::Iterations => params.iterations = coerce_int(raw),
                ScenarioField::FailureRate => params.failure_rate = coerce_float(raw),
                ScenarioField::Workers => params.workers = coerce_int(raw),
            }
        }
    }

    /// Save both domains. `commit` installs the draft scenario defaults
    /// into session state; it is local and normally infallible. The caller
    /// sends the returned defense payload to the server and reports the
    /// outcome via `record_defense_save_error`.
    pub fn save_all<F>(&mut self, commit: F) -> SaveOutcome
    where
        F: FnOnce(ScenarioDefaults) -> Result<(), String>,
    {
        let Some(draft) = self.draft.clone() else {
            return SaveOutcome::NotOpen;
        };

        match commit(draft.scenarios) {
            Ok(()) => {
                self.scenario_error = None;
                self.panel_open = false;
                self.draft = None;
                SaveOutcome::Committed {
                    defense: draft.defense,
                }
            }
            Err(e) => {
                self.scenario_error = Some(e);
                SaveOutcome::CommitFailed {
                    defense: draft.defense,
                }
            }
        }
    }

    /// Record a failed defense write. Shown inline; sticky until a later
    /// `open()` re-fetches successfully.
    pub fn record_defense_save_error(&mut self, message: String) {
        self.defense_error = Some(message);
    }

    /// Discard the draft and close without contacting the server and
    /// without touching session state.
    pub fn cancel(&mut self) {
        self.panel_open = false;
        self.draft = None;
        self.scenario_error = None;
    }

    pub fn is_open(&self) -> bool {
        self.panel_open
    }

    pub fn draft(&self) -> Option<&SettingsDraft> {
        self.draft.as_ref()
    }

    pub fn defense_error(&self) -> Option<&str> {
        self.defense_error.as_deref()
    }

    pub fn scenario_error(&self) -> Option<&str> {
        self.scenario_error.as_deref()
    }

    pub fn open_epoch(&self) -> u64 {
        self.open_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_copy(brute_threshold: i64) -> DefenseThresholds {
        DefenseThresholds {
            brute_threshold,
            ..DefenseThresholds::default()
        }
    }

    #[test]
    fn test_open_copies_session_scenarios() {
        let mut rec = SettingsReconciler::default();
        let mut session = ScenarioDefaults::default();
        session.geohop.iterations = 99;

        rec.open(&session);
        assert!(rec.is_open());
        assert_eq!(rec.draft().unwrap().scenarios.geohop.iterations, 99);
    }

    #[test]
    fn test_fetch_populates_defense_section() {
        let mut rec = SettingsReconciler::default();
        let token = rec.open(&ScenarioDefaults::default());

        assert!(rec.apply_defense_fetch(token, Ok(server_copy(42))));
        assert_eq!(rec.draft().unwrap().defense.brute_threshold, 42);
        assert!(rec.defense_error().is_none());
    }

    #[test]
    fn test_failed_fetch_keeps_previous_values_and_surfaces_error() {
        let mut rec = SettingsReconciler::default();
        let token = rec.open(&ScenarioDefaults::default());
        let before = rec.draft().unwrap().defense;

        let err = ApiError::Status {
            code: 502,
            body: "bad gateway".to_string(),
        };
        assert!(rec.apply_defense_fetch(token, Err(err)));
        assert_eq!(rec.draft().unwrap().defense, before);
        assert!(rec.defense_error().unwrap().contains("502"));
        // Panel stays usable.
        assert!(rec.is_open());
    }

    #[test]
    fn test_second_open_wins_over_first_fetch() {
        let mut rec = SettingsReconciler::default();
        let session = ScenarioDefaults::default();

        let first = rec.open(&session);
        let second = rec.open(&session);

        // Both fetches resolve, first one last-in-flight style.
        assert!(rec.apply_defense_fetch(second, Ok(server_copy(7))));
        assert!(!rec.apply_defense_fetch(first, Ok(server_copy(99))));
        assert_eq!(rec.draft().unwrap().defense.brute_threshold, 7);
    }

    #[test]
    fn test_stale_fetch_after_close_and_reopen_is_dropped() {
        let mut rec = SettingsReconciler::default();
        let session = ScenarioDefaults::default();

        let first = rec.open(&session);
        rec.cancel();
        let second = rec.open(&session);

        assert!(!rec.apply_defense_fetch(first, Ok(server_copy(99))));
        assert_eq!(
            rec.draft().unwrap().defense.brute_threshold,
            DefenseThresholds::default().brute_threshold
        );
        assert!(rec.apply_defense_fetch(second, Ok(server_copy(7))));
    }

    #[test]
    fn test_fetch_after_plain_close_is_dropped() {
        let mut rec = SettingsReconciler::default();
        let token = rec.open(&ScenarioDefaults::default());
        rec.cancel();
        assert!(!rec.apply_defense_fetch(token, Ok(server_copy(3))));
    }

    #[test]
    fn test_cancel_discards_edits_without_touching_session() {
        let mut rec = SettingsReconciler::default();
        let session = ScenarioDefaults::default();

        rec.open(&session);
        rec.edit_scenario(SimType::Bruteforce, ScenarioField::Workers, "8");
        rec.cancel();

        assert!(!rec.is_open());
        assert!(rec.draft().is_none());
        // Session untouched: cancel never had access to it.
        assert_eq!(session.bruteforce.workers, 5);
    }

    #[test]
    fn test_save_commits_scenarios_and_returns_defense_payload() {
        let mut rec = SettingsReconciler::default();
        let mut session = ScenarioDefaults::default();

        let token = rec.open(&session);
        rec.apply_defense_fetch(token, Ok(server_copy(11)));
        rec.edit_scenario(SimType::Bruteforce, ScenarioField::Workers, "8");
        rec.edit_defense(DefenseField::BruteWindow, "30");

        let outcome = rec.save_all(|scenarios| {
            session = scenarios;
            Ok(())
        });

        match outcome {
            SaveOutcome::Committed { defense } => {
                assert_eq!(defense.brute_threshold, 11);
                assert_eq!(defense.brute_window, 30);
            }
            other => panic!("expected Committed, got {:?}", other),
        }
        assert_eq!(session.bruteforce.workers, 8);
        assert!(!rec.is_open());
        assert!(rec.draft().is_none());
    }

    #[test]
    fn test_partial_save_defense_write_fails_panel_still_closed() {
        // Workers -> 8 commits locally even though the defense write 500s.
        let mut rec = SettingsReconciler::default();
        let mut session = ScenarioDefaults::default();

        rec.open(&session);
        rec.edit_scenario(SimType::Bruteforce, ScenarioField::Workers, "8");

        let outcome = rec.save_all(|scenarios| {
            session = scenarios;
            Ok(())
        });
        assert!(matches!(outcome, SaveOutcome::Committed { .. }));
        assert!(!rec.is_open());
        assert_eq!(session.bruteforce.workers, 8);

        // The async write comes back with a 500; error shown inline.
        rec.record_defense_save_error("Server rejected the request (500): boom".to_string());
        assert!(rec.defense_error().unwrap().contains("500"));

        // Next open re-fetches; a successful fetch clears the error.
        let token = rec.open(&session);
        assert!(rec.defense_error().is_some(), "error sticky until re-fetch");
        rec.apply_defense_fetch(token, Ok(DefenseThresholds::default()));
        assert!(rec.defense_error().is_none());
        assert_eq!(rec.draft().unwrap().scenarios.bruteforce.workers, 8);
    }

    #[test]
    fn test_defense_error_stays_if_refetch_fails_again() {
        let mut rec = SettingsReconciler::default();
        rec.record_defense_save_error("save failed".to_string());

        let token = rec.open(&ScenarioDefaults::default());
        rec.apply_defense_fetch(
            token,
            Err(ApiError::Transport("connection refused".to_string())),
        );
        assert!(rec.defense_error().is_some());
    }

    #[test]
    fn test_total_save_failure_keeps_panel_open_with_both_errors() {
        let mut rec = SettingsReconciler::default();
        rec.open(&ScenarioDefaults::default());

        let outcome = rec.save_all(|_| Err("session store unavailable".to_string()));
        assert!(matches!(outcome, SaveOutcome::CommitFailed { .. }));
        assert!(rec.is_open());
        assert!(rec.draft().is_some());
        assert_eq!(rec.scenario_error(), Some("session store unavailable"));

        rec.record_defense_save_error("write failed".to_string());
        assert!(rec.defense_error().is_some());
        assert!(rec.scenario_error().is_some());
    }

    #[test]
    fn test_save_with_no_draft_is_a_noop() {
        let mut rec = SettingsReconciler::default();
        let outcome = rec.save_all(|_| panic!("commit must not run without a draft"));
        assert_eq!(outcome, SaveOutcome::NotOpen);
    }

    #[test]
    fn test_coercion_sentinels() {
        assert_eq!(coerce_int("12"), 12);
        assert_eq!(coerce_int("12.7"), 12);
        assert_eq!(coerce_int("abc"), 0);
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int(" 8 "), 8);
        assert_eq!(coerce_float("0.75"), 0.75);
        assert_eq!(coerce_float("NaN"), 0.0);
        assert_eq!(coerce_float("inf"), 0.0);
        assert_eq!(coerce_float("nonsense"), 0.0);
    }

    #[test]
    fn test_failure_rate_roundtrips_even_for_kinds_that_ignore_it() {
        let mut rec = SettingsReconciler::default();
        let mut session = ScenarioDefaults::default();

        rec.open(&session);
        rec.edit_scenario(SimType::Bruteforce, ScenarioField::FailureRate, "0.33");
        rec.save_all(|scenarios| {
            session = scenarios;
            Ok(())
        });
        assert_eq!(session.bruteforce.failure_rate, 0.33);
    }

    mod coercion_props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn coerce_float_is_always_finite(raw in ".*") {
                prop_assert!(coerce_float(&raw).is_finite());
            }

            #[test]
            fn coerce_int_never_panics(raw in ".*") {
                let _ = coerce_int(&raw);
            }

            #[test]
            fn valid_ints_pass_through(n in -1_000_000i64..1_000_000) {
                prop_assert_eq!(coerce_int(&n.to_string()), n);
            }
        }
    }
}
