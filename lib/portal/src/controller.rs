//! The dashboard controller.
//!
//! One controller lives for one dashboard visit. All mutable state sits in
//! a single `ControllerState` behind a mutex that is never held across an
//! await, so a session event can be handled while a submission is waiting
//! on the network. Once the controller is `Unauthenticated` nothing else is
//! shown to the user: late results are dropped.

use crate::presenter::Presenter;
use crate::state::DashboardState;
use crate::view::{ProfileView, TicketFeed};
use chrono::Utc;
use luminarch_authz::{ApprovalGate, ApprovalStatus, ApprovalStore};
use luminarch_core::{Notifier, Severity, TicketId};
use luminarch_platform_access::{Identity, SessionEvent, SessionEvents, SessionStore};
use luminarch_ticket::{
    Attachment, AttachmentPipeline, MAX_ATTACHMENT_BYTES, ObjectStorage, PendingFile,
    PendingFileSet, Ticket, TicketDraft, TicketRepository, TicketStore, UploadReport,
    ValidationError,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Everything the controller talks to.
#[derive(Clone)]
pub struct PortalServices {
    pub sessions: Arc<dyn SessionStore>,
    pub approvals: Arc<dyn ApprovalStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub notifier: Arc<dyn Notifier>,
    pub presenter: Arc<dyn Presenter>,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The ticket was created; the report covers its attachments.
    Submitted { ticket: Ticket, uploads: UploadReport },
    /// The draft was invalid; nothing was sent.
    Rejected(ValidationError),
    /// The ticket could not be created; staged files are kept.
    Failed { message: String },
    /// The session ended while the submission was in flight.
    Abandoned,
    /// Another submission is still in flight.
    AlreadyInProgress,
    /// The dashboard is not active.
    NotActive,
}

#[derive(Default)]
struct ControllerState {
    dashboard: DashboardState,
    identity: Option<Identity>,
    pending: PendingFileSet,
    submitting: bool,
    redirected: bool,
    feed: Option<TicketFeed>,
}

impl ControllerState {
    fn signed_out(&self) -> bool {
        self.dashboard == DashboardState::Unauthenticated
    }
}

/// Drives the dashboard from session resolution to sign-out.
pub struct DashboardController {
    sessions: Arc<dyn SessionStore>,
    gate: ApprovalGate,
    repository: TicketRepository,
    pipeline: AttachmentPipeline,
    notifier: Arc<dyn Notifier>,
    presenter: Arc<dyn Presenter>,
    state: Mutex<ControllerState>,
}

impl DashboardController {
    pub fn new(services: PortalServices) -> Self {
        Self {
            gate: ApprovalGate::new(services.approvals),
            repository: TicketRepository::new(services.tickets.clone()),
            pipeline: AttachmentPipeline::new(services.storage, services.tickets),
            sessions: services.sessions,
            notifier: services.notifier,
            presenter: services.presenter,
            state: Mutex::new(ControllerState::default()),
        }
    }

    /// Overrides the lifetime of download links.
    #[must_use]
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.pipeline = self.pipeline.with_signed_url_ttl(ttl);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DashboardState {
        self.lock().dashboard
    }

    /// Returns the identity the dashboard was initialized for.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    /// Returns the most recently rendered feed.
    #[must_use]
    pub fn feed(&self) -> Option<TicketFeed> {
        self.lock().feed.clone()
    }

    /// Returns a copy of the staged files.
    #[must_use]
    pub fn pending_files(&self) -> Vec<PendingFile> {
        self.lock().pending.as_slice().to_vec()
    }

    fn signed_out(&self) -> bool {
        self.lock().signed_out()
    }

    /// Sends a message unless the session has already ended.
    fn notify(&self, message: &str, severity: Severity) {
        if !self.signed_out() {
            self.notifier.notify(message, severity);
        }
    }

    /// Resolves the current session and initializes the dashboard.
    ///
    /// With no session the user is redirected to the entry page. A failed
    /// lookup counts as no session.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        match self.sessions.current_session().await {
            Ok(Some(identity)) => self.initialize(identity).await,
            Ok(None) => {
                debug!("no session");
                self.sign_out_locally();
            }
            Err(e) => {
                warn!(error = %e, "session lookup failed, treating as signed out");
                self.sign_out_locally();
            }
        }
    }

    /// Reacts to a session change.
    pub async fn handle_session_event(&self, event: SessionEvent) {
        debug!(event = event.name(), "session event");
        match event {
            SessionEvent::SignedIn(identity) => self.initialize(identity).await,
            SessionEvent::SignedOut => self.sign_out_locally(),
            SessionEvent::TokenRefreshed(identity) => {
                debug!(identity = %identity.id(), "access token refreshed");
            }
        }
    }

    /// Starts the dashboard and follows session events until sign-out.
    pub async fn run(&self, mut events: SessionEvents) {
        self.start().await;
        while !self.signed_out() {
            match events.next().await {
                Some(event) => self.handle_session_event(event).await,
                None => {
                    debug!("session event stream closed");
                    break;
                }
            }
        }
    }

    /// Checks approval for the first identity seen and shows the right view.
    async fn initialize(&self, identity: Identity) {
        {
            let mut state = self.lock();
            if state.identity.is_some() || state.signed_out() {
                debug!(identity = %identity.id(), "dashboard already initialized");
                return;
            }
            state.identity = Some(identity.clone());
        }

        let profile = ProfileView::from(&identity);
        let status = match self.gate.check_approval(identity.id()).await {
            Ok(status) => status,
            Err(e) => {
                error!(identity = %identity.id(), error = %e, "approval check failed");
                self.notify("Could not verify your account status.", Severity::Error);
                ApprovalStatus::NotApproved
            }
        };

        let next = if status.is_approved() {
            DashboardState::Active
        } else {
            DashboardState::PendingApproval
        };
        if !self.transition(next) {
            return;
        }

        if status.is_approved() {
            self.presenter.show_dashboard(&profile);
            self.refresh_tickets().await;
        } else {
            self.presenter.show_pending_approval(&profile);
        }
    }

    fn transition(&self, next: DashboardState) -> bool {
        let mut state = self.lock();
        if !state.dashboard.can_transition_to(next) {
            debug!(from = %state.dashboard, to = %next, "transition ignored");
            return false;
        }
        info!(from = %state.dashboard, to = %next, "dashboard state changed");
        state.dashboard = next;
        true
    }

    /// Moves to `Unauthenticated` and redirects, at most once.
    fn sign_out_locally(&self) {
        let redirect = {
            let mut state = self.lock();
            if !state.signed_out() {
                info!(from = %state.dashboard, "dashboard state changed to unauthenticated");
                state.dashboard = DashboardState::Unauthenticated;
            }
            !std::mem::replace(&mut state.redirected, true)
        };
        if redirect {
            self.presenter.redirect_to_entry();
        }
    }

    /// Ends the session and leaves the dashboard.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        if let Err(e) = self.sessions.sign_out().await {
            warn!(error = %e, "sign-out failed, leaving dashboard anyway");
        }
        self.sign_out_locally();
    }

    /// Stages files, rejecting any over the size limit.
    pub fn add_files(&self, candidates: Vec<PendingFile>) {
        let (rejected, staged) = {
            let mut state = self.lock();
            let rejected = state.pending.add(candidates);
            (rejected, state.pending.as_slice().to_vec())
        };
        for file in &rejected {
            debug!(file = file.name(), size = file.size(), limit = MAX_ATTACHMENT_BYTES, "file rejected");
            self.notify(&format!("{} exceeds 10MB limit", file.name()), Severity::Error);
        }
        self.presenter.render_pending_files(&staged);
    }

    /// Unstages the file at `index`.
    pub fn remove_file(&self, index: usize) {
        let staged = {
            let mut state = self.lock();
            state.pending.remove(index);
            state.pending.as_slice().to_vec()
        };
        self.presenter.render_pending_files(&staged);
    }

    /// Abandons the new-ticket form and its staged files.
    pub fn cancel_new_ticket(&self) {
        self.lock().pending.clear();
        self.presenter.collapse_new_ticket_form();
        self.presenter.render_pending_files(&[]);
    }

    /// Submits a ticket with the staged files.
    #[instrument(skip(self, draft), fields(request_type = %draft.request_type))]
    pub async fn submit_ticket(&self, draft: &TicketDraft) -> SubmitOutcome {
        if let Some(early) = self.submit_precheck() {
            return early;
        }

        let ticket = match draft.validate() {
            Ok(ticket) => ticket,
            Err(e) => {
                debug!(reason = %e, "draft rejected");
                self.notify("Please fill in all required fields.", Severity::Error);
                return SubmitOutcome::Rejected(e);
            }
        };

        let (owner, files) = {
            let mut state = self.lock();
            if state.dashboard != DashboardState::Active {
                return SubmitOutcome::NotActive;
            }
            if state.submitting {
                debug!("submission already in flight");
                return SubmitOutcome::AlreadyInProgress;
            }
            let Some(owner) = state.identity.clone() else {
                return SubmitOutcome::NotActive;
            };
            state.submitting = true;
            (owner, state.pending.as_slice().to_vec())
        };
        self.presenter.set_submit_enabled(false);

        let created = self.repository.create_ticket(&owner, &ticket).await;
        if !self.finish_step() {
            return self.abandon();
        }
        let created = match created {
            Ok(created) => created,
            Err(e) => {
                let message = e.current_context().message().to_string();
                error!(error = %e, "ticket creation failed");
                self.lock().submitting = false;
                self.notify(&format!("Failed to submit: {message}"), Severity::Error);
                self.presenter.set_submit_enabled(true);
                return SubmitOutcome::Failed { message };
            }
        };

        let uploads = if files.is_empty() {
            UploadReport::default()
        } else {
            let notifier = SessionScopedNotifier { controller: self };
            self.pipeline
                .upload_all(created.id, owner.id(), &files, &notifier)
                .await
        };
        if !self.finish_step() {
            return self.abandon();
        }

        info!(ticket = %created.id, attachments = uploads.recorded().count(), "ticket submitted");
        self.notify("Request submitted! We'll get on it.", Severity::Success);
        self.presenter.reset_new_ticket_form();
        let remaining = {
            let mut state = self.lock();
            state.pending.remove_front(files.len());
            state.submitting = false;
            state.pending.as_slice().to_vec()
        };
        self.presenter.render_pending_files(&remaining);
        self.presenter.set_submit_enabled(true);
        self.refresh_tickets().await;

        SubmitOutcome::Submitted {
            ticket: created,
            uploads,
        }
    }

    /// Refuses a submission before validation if the dashboard is not
    /// active or another submission is in flight.
    fn submit_precheck(&self) -> Option<SubmitOutcome> {
        let state = self.lock();
        if state.dashboard != DashboardState::Active || state.identity.is_none() {
            return Some(SubmitOutcome::NotActive);
        }
        if state.submitting {
            debug!("submission already in flight");
            return Some(SubmitOutcome::AlreadyInProgress);
        }
        None
    }

    /// Returns false if the session ended while the last await was pending.
    fn finish_step(&self) -> bool {
        !self.signed_out()
    }

    fn abandon(&self) -> SubmitOutcome {
        self.lock().submitting = false;
        info!("submission abandoned after sign-out");
        SubmitOutcome::Abandoned
    }

    /// Reloads the feed and renders it.
    ///
    /// Attachments are best effort: if they cannot be listed the feed is
    /// rendered without them.
    #[instrument(skip(self))]
    pub async fn refresh_tickets(&self) {
        let owner = {
            let state = self.lock();
            match (&state.dashboard, &state.identity) {
                (DashboardState::Active, Some(identity)) => identity.id().clone(),
                _ => return,
            }
        };

        let tickets = match self.repository.list_tickets(&owner).await {
            Ok(tickets) => tickets,
            Err(e) => {
                error!(error = %e, "ticket list failed");
                let message = e.current_context().message().to_string();
                self.notify(&format!("Failed to load tickets: {message}"), Severity::Error);
                return;
            }
        };

        let ids: Vec<TicketId> = tickets.iter().map(|t| t.id).collect();
        let attachments = match self.repository.list_attachments(&ids).await {
            Ok(attachments) => attachments,
            Err(e) => {
                warn!(error = %e, "attachment list failed, rendering feed without attachments");
                Vec::new()
            }
        };

        let feed = TicketFeed::build(tickets, attachments, Utc::now());
        {
            let mut state = self.lock();
            if state.signed_out() {
                return;
            }
            state.feed = Some(feed.clone());
        }
        self.presenter.render_tickets(&feed);
    }

    /// Issues a download link, or tells the user it could not be issued.
    #[instrument(skip(self, attachment), fields(attachment = %attachment.id))]
    pub async fn download_link(&self, attachment: &Attachment) -> Option<String> {
        match self.pipeline.download_link(attachment).await {
            Ok(url) => Some(url),
            Err(e) => {
                error!(error = %e, "signed url failed");
                self.notify("Could not generate download link", Severity::Error);
                None
            }
        }
    }
}

/// Forwards pipeline notifications while the session is alive.
struct SessionScopedNotifier<'a> {
    controller: &'a DashboardController,
}

impl Notifier for SessionScopedNotifier<'_> {
    fn notify(&self, message: &str, severity: Severity) {
        self.controller.notify(message, severity);
    }
}
