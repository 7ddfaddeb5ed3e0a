//! Scan session: selection, input payload and submission.
//!
//! A session owns everything the user has entered for one scan and talks to
//! the scanning service. Local limits are enforced before anything is sent.
//! While a request is in flight a [`ProgressPacer`] publishes percentage
//! steps; a success is returned once both the response and the pacing are
//! done, an error as soon as it arrives.

use crate::error::{Precondition, Result, ScanError};
use crate::pacing::ProgressPacer;
use allergen_client::{ScanRequest, ScanService};
use allergen_core::{
    AppConfig, FileUpload, InputLimits, InputMode, InputPayload, ScanReport, Selection,
    WizardStage,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Default)]
struct SessionState {
    selection: Selection,
    mode: Option<InputMode>,
    payload: Option<InputPayload>,
    report: Option<Arc<ScanReport>>,
}

/// Holds the in-flight slot for one submission, tagged with its epoch.
///
/// The slot stores `epoch + 1` of the owning submission, 0 when free. A slot
/// tagged with an older epoch belongs to a submission orphaned by `reset` and
/// may be taken over. Dropping clears the slot only while this guard still
/// owns it, including on cancellation.
struct InFlightGuard<'a> {
    slot: &'a AtomicU64,
    tag: u64,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(slot: &'a AtomicU64, epoch: u64) -> Option<Self> {
        let tag = epoch + 1;
        let mut current = slot.load(Ordering::Acquire);
        loop {
            if current == tag {
                return None;
            }
            match slot.compare_exchange(current, tag, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Some(Self { slot, tag }),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let _ = self
            .slot
            .compare_exchange(self.tag, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// One user's scan inputs and their submission.
pub struct ScanSession {
    id: Uuid,
    service: Arc<dyn ScanService>,
    pacer: ProgressPacer,
    limits: InputLimits,
    state: Mutex<SessionState>,
    progress: watch::Sender<u8>,
    /// `epoch + 1` of the outstanding submission, 0 when idle
    in_flight: AtomicU64,
    /// Bumped by `reset`; a submission started in an older epoch stops publishing progress
    epoch: AtomicU64,
}

impl ScanSession {
    /// Create a session with explicit pacing and limits.
    #[must_use]
    pub fn new(service: Arc<dyn ScanService>, pacer: ProgressPacer, limits: InputLimits) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            id: Uuid::new_v4(),
            service,
            pacer,
            limits,
            state: Mutex::new(SessionState::default()),
            progress,
            in_flight: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    /// Create a session using the pacing and limits from configuration.
    #[must_use]
    pub fn from_config(service: Arc<dyn ScanService>, config: &AppConfig) -> Self {
        Self::new(
            service,
            ProgressPacer::from_config(&config.pacing),
            config.limits.clone(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("acquire session state lock")
    }

    /// Identifier used in log output.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.lock().selection.clone()
    }

    /// Replace the selection.
    pub fn set_selection(&self, selection: Selection) {
        self.lock().selection = selection;
    }

    /// Active input mode, if one has been chosen.
    #[must_use]
    pub fn input_mode(&self) -> Option<InputMode> {
        self.lock().mode
    }

    /// Switch the active input mode.
    ///
    /// Choosing a different mode discards the payload entered for the old one.
    pub fn set_input_mode(&self, mode: InputMode) {
        let mut state = self.lock();
        if state.mode == Some(mode) {
            return;
        }
        if state.payload.take().is_some() {
            tracing::debug!(session = %self.id, %mode, "input mode changed, payload discarded");
        }
        state.mode = Some(mode);
    }

    /// Attach content to the active mode.
    ///
    /// Fails with `InvalidMode` when no mode is active or the payload belongs
    /// to a different mode. Size and type limits are checked at submission.
    pub fn set_payload(&self, payload: InputPayload) -> Result<()> {
        let mut state = self.lock();
        match state.mode {
            None => Err(ScanError::InvalidMode(format!(
                "no input mode chosen for {} content",
                payload.mode()
            ))),
            Some(mode) if mode != payload.mode() => Err(ScanError::InvalidMode(format!(
                "{} content does not match the active {mode} mode",
                payload.mode()
            ))),
            Some(_) => {
                state.payload = Some(payload);
                Ok(())
            }
        }
    }

    /// Drop the payload, keeping the mode.
    pub fn clear_payload(&self) {
        self.lock().payload = None;
    }

    /// Current payload.
    #[must_use]
    pub fn payload(&self) -> Option<InputPayload> {
        self.lock().payload.clone()
    }

    /// The current payload, if it is ready to submit.
    pub fn validated_payload(&self) -> Result<InputPayload> {
        let (mode, payload) = {
            let state = self.lock();
            (state.mode, state.payload.clone())
        };

        let mode = mode.ok_or(ScanError::Validation(Precondition::NoInputMode))?;
        let payload = payload.ok_or(ScanError::Validation(Precondition::missing_payload(mode)))?;
        self.check_payload(mode, &payload)?;
        Ok(payload)
    }

    /// Check a payload against the active mode and the local limits.
    pub fn check_payload(&self, mode: InputMode, payload: &InputPayload) -> Result<()> {
        if payload.mode() != mode {
            return Err(ScanError::InvalidMode(format!(
                "{} content does not match the active {mode} mode",
                payload.mode()
            )));
        }
        if payload.is_empty() {
            return Err(Precondition::missing_payload(mode).into());
        }

        match payload {
            InputPayload::Text(text) => {
                let actual = text.chars().count();
                if actual > self.limits.max_text_chars {
                    return Err(Precondition::TextTooLong {
                        actual,
                        limit: self.limits.max_text_chars,
                    }
                    .into());
                }
                Ok(())
            }
            InputPayload::Photo(file) => check_file(
                file,
                mode,
                &self.limits.photo_extensions,
                self.limits.max_photo_bytes,
            ),
            InputPayload::Document(file) => check_file(
                file,
                mode,
                &self.limits.document_extensions,
                self.limits.max_document_bytes,
            ),
        }
    }

    /// Send `payload` for scanning against `selection`.
    ///
    /// Rejected with a state violation while another submission is in flight.
    /// Local preconditions are checked before anything is sent. Progress is
    /// paced on the watch channel; on success this returns after both the
    /// response and the pacing have finished plus the settle delay.
    pub async fn submit(&self, selection: &Selection, payload: &InputPayload) -> Result<ScanReport> {
        let epoch = self.epoch.load(Ordering::Acquire);
        let _guard = InFlightGuard::acquire(&self.in_flight, epoch)
            .ok_or_else(|| ScanError::state_violation(WizardStage::Processing, "submit"))?;

        if selection.is_empty() {
            return Err(Precondition::EmptySelection.into());
        }
        let mode = self
            .input_mode()
            .ok_or_else(|| ScanError::InvalidMode("no input mode chosen".to_string()))?;
        self.check_payload(mode, payload)?;

        self.progress.send_replace(0);
        let request = ScanRequest::new(selection, payload);
        tracing::info!(
            session = %self.id,
            selected = selection.len(),
            %mode,
            "submitting scan"
        );

        let scan = async {
            self.service
                .scan(request)
                .await
                .map_err(ScanError::from_scan_failure)
        };
        let pacing = async {
            self.pacer
                .run_while(&self.progress, || self.epoch.load(Ordering::Acquire) == epoch)
                .await;
            Ok::<(), ScanError>(())
        };

        let (response, ()) = match tokio::try_join!(scan, pacing) {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(session = %self.id, code = e.code(), error = %e, "scan failed");
                return Err(e);
            }
        };
        self.pacer.settle().await;

        let report = ScanReport::from_response(response, selection.len());
        tracing::info!(
            session = %self.id,
            detected = report.detected_count(),
            safe = report.safe,
            "scan completed"
        );
        Ok(report)
    }

    /// Store the report of a completed submission.
    pub fn record_report(&self, report: ScanReport) -> Arc<ScanReport> {
        let report = Arc::new(report);
        self.lock().report = Some(Arc::clone(&report));
        report
    }

    /// Report of the last completed submission.
    #[must_use]
    pub fn report(&self) -> Option<Arc<ScanReport>> {
        self.lock().report.clone()
    }

    /// Subscribe to progress updates.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// Latest progress value.
    #[must_use]
    pub fn current_progress(&self) -> u8 {
        *self.progress.borrow()
    }

    /// Whether a submission started since the last reset is outstanding.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        let tag = self.epoch.load(Ordering::Acquire) + 1;
        self.in_flight.load(Ordering::Acquire) == tag
    }

    /// Clear selection, mode, payload, report and progress.
    ///
    /// A submission still in flight keeps running but no longer publishes
    /// progress or holds the session; a new submission may start at once.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        *self.lock() = SessionState::default();
        self.progress.send_replace(0);
        tracing::debug!(session = %self.id, "session reset");
    }
}

fn check_file(file: &FileUpload, mode: InputMode, extensions: &[String], max_bytes: usize) -> Result<()> {
    let accepted = file
        .extension()
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)));
    if !accepted {
        return Err(Precondition::UnsupportedFileType {
            filename: file.filename.clone(),
            mode,
            expected: extensions.join(", "),
        }
        .into());
    }

    if file.len() > max_bytes {
        return Err(Precondition::FileTooLarge {
            filename: file.filename.clone(),
            mode,
            actual: file.len(),
            limit: max_bytes,
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use allergen_client::ClientError;
    use allergen_core::{AllergenId, ScanResponse};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Service that counts calls and reports everything as safe.
    #[derive(Default)]
    struct SafeService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScanService for SafeService {
        async fn scan(&self, _request: ScanRequest) -> allergen_client::Result<ScanResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ScanResponse {
                matches: Vec::new(),
                safe: true,
                timestamp: "2026-10-16 09:00:00".to_string(),
            })
        }
    }

    struct RejectingService;

    #[async_trait]
    impl ScanService for RejectingService {
        async fn scan(&self, _request: ScanRequest) -> allergen_client::Result<ScanResponse> {
            Err(ClientError::Api {
                endpoint: "/scan".to_string(),
                status: 400,
                detail: "No text could be extracted".to_string(),
            })
        }
    }

    fn session(service: Arc<dyn ScanService>) -> ScanSession {
        ScanSession::new(service, ProgressPacer::immediate(), InputLimits::default())
    }

    fn selection() -> Selection {
        [AllergenId::new("a1").expect("valid id")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_switching_mode_discards_payload() {
        let session = session(Arc::new(SafeService::default()));
        session.set_input_mode(InputMode::Text);
        session
            .set_payload(InputPayload::Text("milk".to_string()))
            .expect("payload");

        session.set_input_mode(InputMode::Text);
        assert!(session.payload().is_some());

        session.set_input_mode(InputMode::Photo);
        assert!(session.payload().is_none());
        assert_eq!(session.input_mode(), Some(InputMode::Photo));
    }

    #[test]
    fn test_payload_must_match_mode() {
        let session = session(Arc::new(SafeService::default()));
        let text = InputPayload::Text("milk".to_string());

        let err = session.set_payload(text.clone()).unwrap_err();
        assert_eq!(err.code(), "INVALID_MODE");

        session.set_input_mode(InputMode::Document);
        let err = session.set_payload(text).unwrap_err();
        assert_eq!(err.code(), "INVALID_MODE");
        assert!(session.payload().is_none());
    }

    #[test]
    fn test_local_limits() {
        let session = session(Arc::new(SafeService::default()));

        let long = "a".repeat(5001);
        assert!(matches!(
            session.check_payload(InputMode::Text, &InputPayload::Text(long)),
            Err(ScanError::Validation(Precondition::TextTooLong { actual: 5001, limit: 5000 }))
        ));
        assert_eq!(
            session.check_payload(InputMode::Text, &InputPayload::Text("  \n ".to_string())),
            Err(ScanError::Validation(Precondition::EmptyText))
        );

        let gif = InputPayload::Photo(FileUpload::new("label.gif", vec![1; 10]));
        assert!(matches!(
            session.check_payload(InputMode::Photo, &gif),
            Err(ScanError::Validation(Precondition::UnsupportedFileType { .. }))
        ));

        let big = InputPayload::Photo(FileUpload::new("label.JPG", vec![0; 5 * 1024 * 1024 + 1]));
        assert!(matches!(
            session.check_payload(InputMode::Photo, &big),
            Err(ScanError::Validation(Precondition::FileTooLarge { .. }))
        ));

        let doc = InputPayload::Document(FileUpload::new("recipe.docx", vec![0; 6 * 1024 * 1024]));
        assert!(session.check_payload(InputMode::Document, &doc).is_ok());
    }

    #[test]
    fn test_validated_payload_names_missing_input() {
        let session = session(Arc::new(SafeService::default()));
        assert_eq!(
            session.validated_payload(),
            Err(ScanError::Validation(Precondition::NoInputMode))
        );

        session.set_input_mode(InputMode::Photo);
        assert_eq!(
            session.validated_payload(),
            Err(ScanError::Validation(Precondition::MissingPhoto))
        );
    }

    #[tokio::test]
    async fn test_empty_input_never_reaches_service() {
        let service = Arc::new(SafeService::default());
        let session = session(service.clone());
        session.set_input_mode(InputMode::Text);

        let err = session
            .submit(&selection(), &InputPayload::Text("   ".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::Validation(Precondition::EmptyText));

        let err = session
            .submit(&Selection::new(), &InputPayload::Text("milk".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::Validation(Precondition::EmptySelection));

        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_submit_success() {
        let service = Arc::new(SafeService::default());
        let session = session(service.clone());
        session.set_input_mode(InputMode::Text);

        let report = session
            .submit(&selection(), &InputPayload::Text("plain rice".to_string()))
            .await
            .expect("submit");
        assert!(report.safe);
        assert_eq!(report.total_allergens_selected, 1);
        assert_eq!(session.current_progress(), 100);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_rejection_detail_verbatim() {
        let session = session(Arc::new(RejectingService));
        session.set_input_mode(InputMode::Text);

        let err = session
            .submit(&selection(), &InputPayload::Text("x".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ScanError::ServiceRejection("No text could be extracted".to_string())
        );
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let session = session(Arc::new(SafeService::default()));
        session.set_selection(selection());
        session.set_input_mode(InputMode::Text);
        session
            .set_payload(InputPayload::Text("milk".to_string()))
            .expect("payload");
        let report = session
            .submit(&selection(), &InputPayload::Text("milk".to_string()))
            .await
            .expect("submit");
        session.record_report(report);

        session.reset();
        assert!(session.selection().is_empty());
        assert!(session.input_mode().is_none());
        assert!(session.payload().is_none());
        assert!(session.report().is_none());
        assert_eq!(session.current_progress(), 0);
    }
}
