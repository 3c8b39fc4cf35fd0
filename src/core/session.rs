use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::error::FluxError;
use super::request::{GenerationRequest, ModelVariant, ReferenceImage};

/// Seam between the session controller and the generation proxy, so
/// the controller can be driven against a test double.
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    /// Run a request to a terminal state and return the sample URL.
    async fn submit(&self, request: &GenerationRequest) -> Result<String, FluxError>;

    /// Fetch and decode a finished sample before it is presented.
    async fn preload(&self, url: &str) -> Result<(), FluxError>;
}

/// Controller status. Succeeded and Failed are transient: the outcome
/// is recorded on the session and the controller returns to Idle so a
/// manual retry is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Submitting,
}

/// Where an image handle came from. Decides how edit mode forwards it:
/// local drops resend the retained inline payload, provider results go
/// back as a source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    LocalDrop,
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Provider URL or local preview path.
    pub handle: String,
    pub origin: ImageOrigin,
}

/// Drag-enter/leave nesting counter. Enter and leave fire once per
/// nested element in the host, so a plain boolean flickers; the visual
/// drag state is active only while the depth is positive, and a drop
/// resets it unconditionally to tolerate unpaired events.
#[derive(Debug, Default)]
pub struct DragState {
    depth: u32,
}

impl DragState {
    pub fn enter(&mut self) {
        self.depth += 1;
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.depth = 0;
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }
}

/// Recurring elapsed-time readout for one attempt. The task is owned
/// by the session and aborted on drop, so stopping it exactly once is
/// a matter of taking it out of its Option.
struct ElapsedTimer {
    handle: JoinHandle<()>,
}

impl ElapsedTimer {
    const CADENCE: Duration = Duration::from_millis(100);

    fn start(readout: watch::Sender<String>, started: Instant) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Self::CADENCE);
            loop {
                interval.tick().await;
                let _ = readout.send(format!("{:.1}s", started.elapsed().as_secs_f32()));
            }
        });
        Self { handle }
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Outcome of a spawned generation attempt, delivered back to the
/// driving loop.
#[derive(Debug)]
pub enum SessionEvent {
    Finished(Result<String, FluxError>),
}

/// One generation attempt at a time: prompt, credential, variant,
/// edit-mode reference and the presentation state derived from them.
/// The Idle guard in [`Session::trigger`] is the only concurrency
/// control: overlapping attempts are silently dropped.
pub struct Session {
    backend: Arc<dyn GenerateBackend>,
    credential: Option<String>,
    variant: ModelVariant,
    edit_mode: bool,

    status: SessionStatus,
    current: Option<ImageRef>,
    previous: Option<ImageRef>,
    /// The single retained base64 payload from the last local drop.
    /// Overwritten whole on each new drop, never merged.
    inline_reference: Option<String>,
    /// Crossfade progress from previous to current, 0.0 to 1.0.
    crossfade: f32,
    drag: DragState,

    timer: Option<ElapsedTimer>,
    readout_tx: watch::Sender<String>,
    readout_rx: watch::Receiver<String>,

    events_tx: async_channel::Sender<SessionEvent>,
    events_rx: async_channel::Receiver<SessionEvent>,

    error: Option<String>,
    warning: Option<String>,
}

impl Session {
    pub fn new(
        backend: Arc<dyn GenerateBackend>,
        credential: Option<String>,
        variant: ModelVariant,
    ) -> Self {
        let (readout_tx, readout_rx) = watch::channel(String::new());
        let (events_tx, events_rx) = async_channel::unbounded();
        Self {
            backend,
            credential,
            variant,
            edit_mode: false,
            status: SessionStatus::Idle,
            current: None,
            previous: None,
            inline_reference: None,
            crossfade: 1.0,
            drag: DragState::default(),
            timer: None,
            readout_tx,
            readout_rx,
            events_tx,
            events_rx,
            error: None,
            warning: None,
        }
    }

    /// Start a generation attempt. No-op when the trimmed prompt is
    /// empty or an attempt is already in flight; a missing credential
    /// surfaces a warning without leaving Idle.
    pub fn trigger(&mut self, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() || self.status != SessionStatus::Idle {
            return;
        }
        if self.credential.is_none() {
            self.warning = Some(FluxError::missing_key().to_string());
            return;
        }

        self.error = None;
        self.warning = None;
        self.status = SessionStatus::Submitting;

        let started = Instant::now();
        let _ = self.readout_tx.send("0.0s".to_string());
        self.timer = Some(ElapsedTimer::start(self.readout_tx.clone(), started));

        let request = GenerationRequest {
            prompt: prompt.to_string(),
            variant: self.variant,
            reference: self.build_reference(),
        };

        let backend = self.backend.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match backend.submit(&request).await {
                Ok(url) => backend.preload(&url).await.map(|_| url),
                Err(e) => Err(e),
            };
            let _ = events.send(SessionEvent::Finished(result)).await;
        });
    }

    /// Apply a delivered outcome. The timer is taken out of its slot
    /// and dropped here, which aborts it; both branches go through the
    /// same take, so it stops exactly once per attempt.
    pub fn apply(&mut self, event: SessionEvent) {
        let SessionEvent::Finished(result) = event;
        drop(self.timer.take());

        match result {
            Ok(url) => {
                self.promote(ImageRef {
                    handle: url,
                    origin: ImageOrigin::Provider,
                });
            }
            Err(e) => {
                // Failure keeps the prior image state for a retry, but
                // never leaves a stale elapsed readout on screen.
                let _ = self.readout_tx.send(String::new());
                self.error = Some(e.to_string());
            }
        }
        self.status = SessionStatus::Idle;
    }

    /// Drain and apply any delivered outcomes without blocking.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Accept a dropped or pasted file. Non-image bytes are silently
    /// ignored; an image becomes the new current reference through the
    /// same promote sequence as a finished generation, and edit mode
    /// switches on. The drop always collapses the drag state.
    pub async fn ingest_dropped_file(&mut self, path: &Path) -> std::io::Result<bool> {
        self.drag.reset();

        let bytes = tokio::fs::read(path).await?;
        if image::guess_format(&bytes).is_err() {
            return Ok(false);
        }

        self.inline_reference = Some(BASE64.encode(&bytes));
        self.promote(ImageRef {
            handle: path.display().to_string(),
            origin: ImageOrigin::LocalDrop,
        });
        self.edit_mode = true;
        Ok(true)
    }

    /// Demote current to previous and restart the crossfade.
    fn promote(&mut self, image: ImageRef) {
        self.previous = self.current.take();
        self.current = Some(image);
        self.crossfade = 0.0;
    }

    /// Edit mode forwards the current image by origin: the retained
    /// inline payload for local drops, the URL for provider results.
    /// Never both.
    fn build_reference(&self) -> Option<ReferenceImage> {
        if !self.edit_mode {
            return None;
        }
        match self.current.as_ref()? {
            ImageRef {
                origin: ImageOrigin::LocalDrop,
                ..
            } => self.inline_reference.clone().map(ReferenceImage::Inline),
            ImageRef {
                origin: ImageOrigin::Provider,
                handle,
            } => Some(ReferenceImage::Url(handle.clone())),
        }
    }

    pub fn advance_crossfade(&mut self, delta: f32) {
        self.crossfade = (self.crossfade + delta).min(1.0);
    }

    // Accessors for the driving UI.

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_generating(&self) -> bool {
        self.status == SessionStatus::Submitting
    }

    pub fn elapsed_readout(&self) -> String {
        self.readout_rx.borrow().clone()
    }

    pub fn current(&self) -> Option<&ImageRef> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&ImageRef> {
        self.previous.as_ref()
    }

    pub fn crossfade(&self) -> f32 {
        self.crossfade
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
    }

    pub fn set_credential(&mut self, credential: Option<String>) {
        self.credential = credential;
    }

    pub fn set_variant(&mut self, variant: ModelVariant) {
        self.variant = variant;
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn drag_mut(&mut self) -> &mut DragState {
        &mut self.drag
    }

    pub fn drag_active(&self) -> bool {
        self.drag.is_active()
    }

    pub fn events(&self) -> async_channel::Receiver<SessionEvent> {
        self.events_rx.clone()
    }
}
