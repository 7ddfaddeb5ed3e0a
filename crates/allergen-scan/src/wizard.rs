//! The four-step scan wizard.
//!
//! ```text
//! Select ──advance──▶ Input ──advance──▶ Processing ──ok──▶ Report
//!    ▲                  │  ▲                  │                │
//!    └────retreat───────┘  └──────error───────┘                │
//!    └──────────────────────────reset──────────────────────────┘
//! ```
//!
//! Every method takes `&self`; concurrent callers are arbitrated by the
//! stage check, which happens under the wizard lock before any await. The
//! lock is never held across an await. A submission captures the wizard
//! generation when it is dispatched and its outcome is only applied if the
//! generation is unchanged, so a reset while processing drops the result.

use crate::catalog::AllergenCatalog;
use crate::error::{Precondition, Result, ScanError};
use crate::highlight;
use crate::session::ScanSession;
use allergen_core::{AllergenId, InputMode, InputPayload, ScanReport, Selection, WizardStage};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

struct WizardState {
    stage: WizardStage,
    generation: u64,
    last_error: Option<ScanError>,
}

/// Drives a [`ScanSession`] through select, input, processing and report.
pub struct WizardStateMachine {
    catalog: Arc<AllergenCatalog>,
    session: ScanSession,
    state: Mutex<WizardState>,
}

impl WizardStateMachine {
    /// Create a wizard at the `Select` stage.
    #[must_use]
    pub fn new(catalog: Arc<AllergenCatalog>, session: ScanSession) -> Self {
        Self {
            catalog,
            session,
            state: Mutex::new(WizardState {
                stage: WizardStage::Select,
                generation: 0,
                last_error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WizardState> {
        self.state.lock().expect("acquire wizard state lock")
    }

    /// Load the allergen catalog. Call once before the user starts selecting.
    pub async fn load_catalog(&self) -> Result<usize> {
        self.catalog.load().await
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> WizardStage {
        self.lock().stage
    }

    /// The catalog feeding the selection step.
    #[must_use]
    pub fn catalog(&self) -> &AllergenCatalog {
        &self.catalog
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Toggle an allergen in the selection. `Select` stage only.
    pub fn toggle(&self, id: &AllergenId) -> Result<Selection> {
        let state = self.lock();
        require_stage(&state, WizardStage::Select, "toggle")?;

        let selection = self.catalog.toggle(&self.session.selection(), id)?;
        self.session.set_selection(selection.clone());
        tracing::debug!(%id, selected = selection.len(), "selection toggled");
        Ok(selection)
    }

    /// Choose the input mode. `Input` stage only.
    pub fn set_input_mode(&self, mode: InputMode) -> Result<()> {
        let state = self.lock();
        require_stage(&state, WizardStage::Input, "set_input_mode")?;
        self.session.set_input_mode(mode);
        Ok(())
    }

    /// Attach content to the active input mode. `Input` stage only.
    pub fn set_payload(&self, payload: InputPayload) -> Result<()> {
        let state = self.lock();
        require_stage(&state, WizardStage::Input, "set_payload")?;
        self.session.set_payload(payload)
    }

    /// Move forward one stage.
    ///
    /// From `Select` this checks the selection and the catalog. From `Input`
    /// it validates the payload, moves to `Processing` immediately and
    /// resolves once the submission has finished: `Report` on success, back
    /// to `Input` with the error on failure. In any other stage it is a
    /// state violation.
    pub async fn advance(&self) -> Result<WizardStage> {
        let (generation, selection, payload) = {
            let mut state = self.lock();
            match state.stage {
                WizardStage::Select => {
                    record(&mut state, self.check_selection())?;
                    state.stage = WizardStage::Input;
                    tracing::info!(
                        from = %WizardStage::Select,
                        to = %WizardStage::Input,
                        "wizard advanced"
                    );
                    return Ok(WizardStage::Input);
                }
                WizardStage::Input => {
                    let selection = self.session.selection();
                    let checked = if selection.is_empty() {
                        Err(Precondition::EmptySelection.into())
                    } else {
                        self.session.validated_payload()
                    };
                    let payload = record(&mut state, checked)?;

                    state.stage = WizardStage::Processing;
                    state.generation += 1;
                    state.last_error = None;
                    tracing::info!(
                        from = %WizardStage::Input,
                        to = %WizardStage::Processing,
                        generation = state.generation,
                        "wizard advanced"
                    );
                    (state.generation, selection, payload)
                }
                stage @ (WizardStage::Processing | WizardStage::Report) => {
                    return Err(ScanError::state_violation(stage, "advance"));
                }
            }
        };

        let outcome = self.session.submit(&selection, &payload).await;
        self.complete(generation, outcome)
    }

    fn check_selection(&self) -> Result<()> {
        if self.session.selection().is_empty() {
            return Err(Precondition::EmptySelection.into());
        }
        self.catalog.ensure_ready()
    }

    fn complete(&self, generation: u64, outcome: Result<ScanReport>) -> Result<WizardStage> {
        let mut state = self.lock();
        if state.generation != generation || state.stage != WizardStage::Processing {
            tracing::warn!(
                generation,
                current = state.generation,
                stage = %state.stage,
                "discarding stale scan outcome"
            );
            return Err(ScanError::Superseded);
        }

        match outcome {
            Ok(report) => {
                self.session.record_report(report);
                state.stage = WizardStage::Report;
                tracing::info!(from = %WizardStage::Processing, to = %WizardStage::Report, "wizard advanced");
                Ok(WizardStage::Report)
            }
            Err(e) => {
                state.stage = WizardStage::Input;
                state.last_error = Some(e.clone());
                tracing::info!(
                    from = %WizardStage::Processing,
                    to = %WizardStage::Input,
                    code = e.code(),
                    "scan failed, wizard returned to input"
                );
                Err(e)
            }
        }
    }

    /// Move back from `Input` to `Select`. Any other stage is a state violation.
    pub fn retreat(&self) -> Result<WizardStage> {
        let mut state = self.lock();
        match state.stage {
            WizardStage::Input => {
                state.stage = WizardStage::Select;
                state.last_error = None;
                tracing::info!(from = %WizardStage::Input, to = %WizardStage::Select, "wizard retreated");
                Ok(WizardStage::Select)
            }
            stage => Err(ScanError::state_violation(stage, "retreat")),
        }
    }

    /// Start over: clear the session, return to `Select` and reload the catalog.
    ///
    /// Any submission still in flight is orphaned; its outcome is discarded.
    /// Returns the outcome of the catalog reload.
    pub async fn reset(&self) -> Result<usize> {
        {
            let mut state = self.lock();
            let from = state.stage;
            state.stage = WizardStage::Select;
            state.generation += 1;
            state.last_error = None;
            self.session.reset();
            tracing::info!(%from, generation = state.generation, "wizard reset");
        }
        self.catalog.load().await
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.session.selection()
    }

    /// Report of the last successful scan, available in the `Report` stage.
    #[must_use]
    pub fn report(&self) -> Option<Arc<ScanReport>> {
        self.session.report()
    }

    /// The submitted text with matches highlighted, for text scans.
    #[must_use]
    pub fn highlighted_text(&self) -> Option<String> {
        let report = self.session.report()?;
        let payload = self.session.payload()?;
        payload
            .text()
            .map(|text| highlight::render(text, &report.matches))
    }

    /// Subscribe to submission progress.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.session.progress()
    }

    /// Error from the last failed transition, cleared on the next successful one.
    #[must_use]
    pub fn last_error(&self) -> Option<ScanError> {
        self.lock().last_error.clone()
    }
}

fn require_stage(state: &WizardState, expected: WizardStage, operation: &'static str) -> Result<()> {
    if state.stage == expected {
        Ok(())
    } else {
        Err(ScanError::state_violation(state.stage, operation))
    }
}

/// Remember a failed check as the last error; clear it on success.
fn record<T>(state: &mut WizardState, checked: Result<T>) -> Result<T> {
    match &checked {
        Ok(_) => state.last_error = None,
        Err(e) => {
            tracing::debug!(stage = %state.stage, code = e.code(), error = %e, "precondition failed");
            state.last_error = Some(e.clone());
        }
    }
    checked
}
