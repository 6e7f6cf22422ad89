//! The submit-and-confirm workflow shared by every document family.
//!
//! A [`DocumentAdapter`] supplies the family-specific operations; the
//! [`Processing`] iterator drives them in order:
//!
//! 1. service status check (optional), stop when the authority is offline
//! 2. duplicate check by key (optional), stop when already filed
//! 3. signed submission, stop when rejected or unanswered
//! 4. receipt polling with waits derived from the authority's average
//!    processing time; only the final poll is yielded
//!
//! Business outcomes end the sequence quietly. Transport and signing faults
//! surface as an `Err` item, after which the iterator is exhausted.

use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use std::time::{Duration, Instant};
use tracing::debug;

use super::error::EdocError;
use super::step::{ProcessedDocument, ProcessingStep};
use super::types::DocumentKey;

/// Polls after the first one when the adapter does not say otherwise.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 5;

/// Scale applied to the average wait before the first receipt poll.
pub const FIRST_POLL_FACTOR: f64 = 1.3;

/// Scale applied to the average wait before every further poll.
pub const RETRY_POLL_FACTOR: f64 = 1.5;

/// `wait` scaled by `factor`, saturating at [`Duration::MAX`].
fn scaled(wait: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(wait.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Request for a cancellation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancelamento {
    /// Access key (or NFS-e number) of the document being cancelled.
    pub chave: String,
    /// Authorization protocol number.
    pub protocolo: String,
    pub justificativa: String,
    /// Event time; the current Brasília time when absent.
    pub data_hora: Option<chrono::DateTime<chrono::FixedOffset>>,
    /// Cancellation reason code, used by NFS-e providers.
    pub codigo: Option<String>,
}

impl Cancelamento {
    pub fn new(
        chave: impl Into<String>,
        protocolo: impl Into<String>,
        justificativa: impl Into<String>,
    ) -> Self {
        Self {
            chave: chave.into(),
            protocolo: protocolo.into(),
            justificativa: justificativa.into(),
            data_hora: None,
            codigo: None,
        }
    }

    pub fn data_hora(mut self, dh: chrono::DateTime<chrono::FixedOffset>) -> Self {
        self.data_hora = Some(dh);
        self
    }

    pub fn codigo(mut self, codigo: impl Into<String>) -> Self {
        self.codigo = Some(codigo.into());
        self
    }
}

/// Why a workflow stopped before resolving a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    ServiceUnavailable,
    MissingDocumentKey,
    AlreadyFiled,
    /// Submission or receipt came back without a readable response.
    NoResponse,
    Rejected,
    /// Poll attempts ran out while the batch was still processing.
    StillProcessing,
    DeadlineExceeded,
}

/// Where a [`Processing`] sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    NotStarted,
    ServiceChecked,
    DuplicateChecked,
    Submitted,
    ReceiptPending,
    ReceiptResolved,
    Aborted(AbortReason),
    /// A transport or signing fault was returned.
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ReceiptResolved | Self::Aborted(_) | Self::Failed
        )
    }
}

/// Blocking delay between receipt polls.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Family-specific operations driven by [`Processing`].
pub trait DocumentAdapter {
    /// Unsigned document handed to [`DocumentAdapter::process_document`].
    type Document;
    /// Typed response shared by every operation of the family.
    type Response: Clone;
    /// Web service identifiers accepted by [`DocumentAdapter::locate_url`].
    type Service: Copy;

    fn status_servico(&self) -> Result<ProcessingStep<Self::Response>, EdocError>;

    fn get_document_id(&self, document: &Self::Document) -> Option<DocumentKey>;

    fn consulta_documento(
        &self,
        key: &DocumentKey,
    ) -> Result<ProcessingStep<Self::Response>, EdocError>;

    /// Sign, frame and transmit the document.
    fn envia_documento(
        &self,
        document: &Self::Document,
    ) -> Result<ProcessingStep<Self::Response>, EdocError>;

    /// Poll the outcome of the submission recorded in `submission`.
    fn consulta_recibo(
        &self,
        submission: &ProcessingStep<Self::Response>,
    ) -> Result<ProcessingStep<Self::Response>, EdocError>;

    fn cancela_documento(
        &self,
        request: &Cancelamento,
    ) -> Result<ProcessingStep<Self::Response>, EdocError>;

    fn is_service_operational(&self, step: &ProcessingStep<Self::Response>) -> bool;

    fn is_already_filed(&self, step: &ProcessingStep<Self::Response>) -> bool;

    fn is_accepted(&self, step: &ProcessingStep<Self::Response>) -> bool;

    fn is_still_processing(&self, step: &ProcessingStep<Self::Response>) -> bool;

    /// Authority-declared average processing time for the submission.
    fn average_wait(&self, submission: &ProcessingStep<Self::Response>) -> Duration;

    fn locate_url(&self, service: Self::Service) -> Result<String, EdocError>;

    fn max_poll_attempts(&self) -> u32 {
        DEFAULT_MAX_POLL_ATTEMPTS
    }

    fn checks_service_before_sending(&self) -> bool {
        true
    }

    fn checks_document_before_sending(&self) -> bool {
        true
    }

    /// Archival bundle (document plus protocol) for the final step.
    fn build_processed_bundle(
        &self,
        _document: &Self::Document,
        _submission: &ProcessingStep<Self::Response>,
        _receipt: &ProcessingStep<Self::Response>,
    ) -> Option<ProcessedDocument> {
        None
    }

    /// Start the workflow for `document`. Nothing is sent until the
    /// returned iterator is advanced.
    fn process_document(&self, document: Self::Document) -> Processing<'_, Self>
    where
        Self: Sized,
    {
        Processing::new(self, document)
    }
}

/// Lazy sequence of [`ProcessingStep`]s for one document.
pub struct Processing<'a, A: DocumentAdapter> {
    adapter: &'a A,
    document: A::Document,
    state: WorkflowState,
    submission: Option<ProcessingStep<A::Response>>,
    sleeper: Box<dyn Sleeper + 'a>,
    deadline: Option<Instant>,
}

/// Everything a finished [`Processing`] produced.
#[derive(Debug, Clone)]
pub struct ProcessingReport<R> {
    pub steps: Vec<ProcessingStep<R>>,
    pub state: WorkflowState,
}

impl<R> ProcessingReport<R> {
    pub fn last(&self) -> Option<&ProcessingStep<R>> {
        self.steps.last()
    }
}

type Item<A> = Result<ProcessingStep<<A as DocumentAdapter>::Response>, EdocError>;

impl<'a, A: DocumentAdapter> Processing<'a, A> {
    pub fn new(adapter: &'a A, document: A::Document) -> Self {
        Self {
            adapter,
            document,
            state: WorkflowState::NotStarted,
            submission: None,
            sleeper: Box::new(ThreadSleeper),
            deadline: None,
        }
    }

    /// Replace the thread sleeper, e.g. with a recording one in tests.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'a) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Stop polling once another wait would cross `timeout` from now.
    ///
    /// A timeout beyond what the clock can represent means no deadline.
    pub fn with_deadline(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn document(&self) -> &A::Document {
        &self.document
    }

    /// Drive the workflow to the end, stopping at the first fault.
    pub fn complete(mut self) -> Result<ProcessingReport<A::Response>, EdocError> {
        let mut steps = Vec::new();
        for item in self.by_ref() {
            steps.push(item?);
        }
        Ok(ProcessingReport {
            steps,
            state: self.state,
        })
    }

    fn abort(&mut self, reason: AbortReason) {
        debug!(?reason, "workflow aborted");
        self.state = WorkflowState::Aborted(reason);
    }

    fn fail(&mut self, err: EdocError) -> Option<Item<A>> {
        debug!(error = %err, "workflow failed");
        self.state = WorkflowState::Failed;
        Some(Err(err))
    }

    fn check_service(&mut self) -> Option<Item<A>> {
        let step = match self.adapter.status_servico() {
            Ok(step) => step,
            Err(e) => return self.fail(e),
        };
        if self.adapter.is_service_operational(&step) {
            debug!(operation = step.operation(), "service operational");
            self.state = WorkflowState::ServiceChecked;
        } else {
            self.abort(AbortReason::ServiceUnavailable);
        }
        Some(Ok(step))
    }

    fn check_duplicate(&mut self) -> Option<Item<A>> {
        let Some(key) = self.adapter.get_document_id(&self.document) else {
            self.abort(AbortReason::MissingDocumentKey);
            return None;
        };
        let step = match self.adapter.consulta_documento(&key) {
            Ok(step) => step,
            Err(e) => return self.fail(e),
        };
        if self.adapter.is_already_filed(&step) {
            self.abort(AbortReason::AlreadyFiled);
        } else {
            debug!(%key, "document not filed yet");
            self.state = WorkflowState::DuplicateChecked;
        }
        Some(Ok(step))
    }

    fn submit(&mut self) -> Option<Item<A>> {
        let step = match self.adapter.envia_documento(&self.document) {
            Ok(step) => step,
            Err(e) => return self.fail(e),
        };
        if step.response().is_none() {
            self.abort(AbortReason::NoResponse);
        } else if !self.adapter.is_accepted(&step) {
            self.abort(AbortReason::Rejected);
        } else {
            debug!(operation = step.operation(), "submission accepted");
            self.submission = Some(step.clone());
            self.state = WorkflowState::Submitted;
        }
        Some(Ok(step))
    }

    fn poll_receipt(&mut self) -> Option<Item<A>> {
        let submission = self.submission.take()?;
        let wait = self.adapter.average_wait(&submission);
        self.state = WorkflowState::ReceiptPending;

        self.sleeper.sleep(scaled(wait, FIRST_POLL_FACTOR));
        let mut receipt = match self.adapter.consulta_recibo(&submission) {
            Ok(step) => step,
            Err(e) => return self.fail(e),
        };
        if receipt.response().is_none() {
            self.abort(AbortReason::NoResponse);
            return None;
        }

        let retry_wait = scaled(wait, RETRY_POLL_FACTOR);
        let mut attempts = 0;
        let mut out_of_time = false;
        let max_attempts = self.adapter.max_poll_attempts();
        while self.adapter.is_still_processing(&receipt) && attempts < max_attempts {
            let past_deadline = self.deadline.is_some_and(|deadline| {
                Instant::now()
                    .checked_add(retry_wait)
                    .is_none_or(|wake| wake > deadline)
            });
            if past_deadline {
                out_of_time = true;
                break;
            }
            debug!(attempts, ?retry_wait, "batch still processing");
            self.sleeper.sleep(retry_wait);
            attempts += 1;
            receipt = match self.adapter.consulta_recibo(&submission) {
                Ok(step) => step,
                Err(e) => return self.fail(e),
            };
            if receipt.response().is_none() {
                self.abort(AbortReason::NoResponse);
                return None;
            }
        }

        if out_of_time {
            self.abort(AbortReason::DeadlineExceeded);
        } else if self.adapter.is_still_processing(&receipt) {
            self.abort(AbortReason::StillProcessing);
        } else {
            debug!(attempts, "receipt resolved");
            self.state = WorkflowState::ReceiptResolved;
        }

        if let Some(bundle) =
            self.adapter
                .build_processed_bundle(&self.document, &submission, &receipt)
        {
            receipt = receipt.with_processed(bundle);
        }
        Some(Ok(receipt))
    }
}

impl<A: DocumentAdapter> Iterator for Processing<'_, A> {
    type Item = Item<A>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                WorkflowState::NotStarted => {
                    if self.adapter.checks_service_before_sending() {
                        return self.check_service();
                    }
                    self.state = WorkflowState::ServiceChecked;
                }
                WorkflowState::ServiceChecked => {
                    if self.adapter.checks_document_before_sending() {
                        return self.check_duplicate();
                    }
                    self.state = WorkflowState::DuplicateChecked;
                }
                WorkflowState::DuplicateChecked => return self.submit(),
                WorkflowState::Submitted => return self.poll_receipt(),
                WorkflowState::ReceiptPending
                | WorkflowState::ReceiptResolved
                | WorkflowState::Aborted(_)
                | WorkflowState::Failed => return None,
            }
        }
    }
}

impl<A: DocumentAdapter> FusedIterator for Processing<'_, A> {}
