//! Single owner of the viewer's mutable state.
//!
//! Network events and pointer input arrive independently, but both are
//! turned into [`ViewerCommand`]s and applied here one at a time on the
//! thread that owns the [`ViewerState`]. Nothing else touches the ring or the
//! transform directly, so the two redraw producers always see a consistent
//! parameter block.

use std::time::Instant;

use bytes::Bytes;

use crate::frequency::FrequencyEstimator;
use crate::interaction::{InteractionController, ScreenPoint, Viewport, WheelDirection};
use crate::observer::ViewerObserver;
use crate::protocol::StreamGeometry;
use crate::ring::{RenderDevice, RingBufferStore};
use crate::transform::{TransformState, ZoomLimits};

/// Status reported while a surface is being allocated.
pub const STATUS_INITIALIZING: &str = "Initializing GPU...";

/// Status reported once the surface is ready for rows.
pub const STATUS_READY: &str = "GPU ready";

/// Reason given when no rendering adapter is available.
pub const STATUS_NO_ADAPTER: &str = "No GPU adapter found";

/// Event produced by the streaming session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Transport opened (`true`) or closed (`false`).
    Connection(bool),
    /// Geometry announcement from a control frame.
    Geometry(StreamGeometry),
    /// One binary row frame, not yet length-checked.
    Row(Bytes),
}

/// Pointer input already mapped to viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    /// One wheel step at `cursor`.
    Wheel {
        /// Pointer position.
        cursor: ScreenPoint,
        /// Current viewport size.
        viewport: Viewport,
        /// Zoom direction.
        direction: WheelDirection,
    },
    /// Primary button pressed on the canvas.
    Press {
        /// Pointer position.
        pos: ScreenPoint,
    },
    /// Pointer moved while pressed.
    Drag {
        /// Pointer position.
        pos: ScreenPoint,
        /// Current viewport size.
        viewport: Viewport,
    },
    /// Button released or pointer left the canvas.
    Release,
    /// Double activation: back to the identity transform.
    Reset,
}

/// Everything that may mutate the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    /// From the streaming session.
    Stream(StreamEvent),
    /// From the canvas.
    Input(InputCommand),
}

impl From<StreamEvent> for ViewerCommand {
    fn from(event: StreamEvent) -> Self {
        Self::Stream(event)
    }
}

impl From<InputCommand> for ViewerCommand {
    fn from(input: InputCommand) -> Self {
        Self::Input(input)
    }
}

/// Coalesces redraw requests into at most one pending paint.
#[derive(Debug, Default, Clone, Copy)]
pub struct RedrawScheduler {
    pending: bool,
}

impl RedrawScheduler {
    /// Request a redraw. Returns `true` only if none was pending.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Consume the pending request at paint time.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

/// Ring, transform, estimator and redraw state behind one owner.
pub struct ViewerState<D: RenderDevice, O: ViewerObserver> {
    store: RingBufferStore<D>,
    transform: TransformState,
    interaction: InteractionController,
    frequency: FrequencyEstimator,
    redraw: RedrawScheduler,
    observer: O,
    connected: bool,
    last_frequency: Option<u32>,
    dropped_rows: u64,
}

impl<D: RenderDevice, O: ViewerObserver> ViewerState<D, O> {
    /// Create a viewer drawing through `device`.
    pub fn new(device: D, observer: O, limits: ZoomLimits) -> Self {
        Self {
            store: RingBufferStore::new(device),
            transform: TransformState::IDENTITY,
            interaction: InteractionController::new(limits),
            frequency: FrequencyEstimator::new(),
            redraw: RedrawScheduler::default(),
            observer,
            connected: false,
            last_frequency: None,
            dropped_rows: 0,
        }
    }

    /// Apply one command. `now` drives the frequency estimator.
    pub fn apply(&mut self, command: ViewerCommand, now: Instant) {
        match command {
            ViewerCommand::Stream(event) => self.handle_stream(event, now),
            ViewerCommand::Input(input) => self.handle_input(input),
        }
    }

    fn handle_stream(&mut self, event: StreamEvent, now: Instant) {
        match event {
            StreamEvent::Connection(connected) => {
                self.connected = connected;
                self.observer.on_connection_change(connected);
                self.frequency.reset();
                self.report_frequency(Some(0));
            }
            StreamEvent::Geometry(geometry) => self.configure(geometry),
            StreamEvent::Row(pixels) => self.ingest(&pixels, now),
        }
    }

    fn configure(&mut self, geometry: StreamGeometry) {
        if self.store.is_ready() && self.store.geometry() == Some(geometry) {
            tracing::trace!(?geometry, "Geometry unchanged, keeping surface");
            return;
        }

        self.observer.on_status_change(STATUS_INITIALIZING);
        match self.store.configure(geometry) {
            Ok(()) => {
                tracing::info!(
                    width = geometry.width,
                    max_lines = geometry.max_lines,
                    "Ring buffer configured"
                );
                self.frequency.reset();
                self.observer.on_status_change(STATUS_READY);
                self.store.publish_parameters(&self.transform);
                self.redraw.request();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ring buffer configuration failed");
                self.observer.on_status_change(&e.status_text());
            }
        }
    }

    fn ingest(&mut self, pixels: &[u8], now: Instant) {
        if !self.store.is_ready() {
            tracing::trace!(len = pixels.len(), "Row before configuration, ignored");
            return;
        }

        if let Err(e) = self.store.write_row(pixels) {
            self.dropped_rows += 1;
            tracing::debug!(error = %e, dropped = self.dropped_rows, "Row dropped");
            return;
        }

        self.store.publish_parameters(&self.transform);
        self.redraw.request();

        if let Some(rate) = self.frequency.tick(self.store.total_lines(), now) {
            self.report_frequency(Some(rate));
        }
    }

    fn handle_input(&mut self, input: InputCommand) {
        let changed = match input {
            InputCommand::Wheel {
                cursor,
                viewport,
                direction,
            } => self
                .interaction
                .wheel(&mut self.transform, cursor, viewport, direction),
            InputCommand::Press { pos } => {
                self.interaction.press(pos);
                false
            }
            InputCommand::Drag { pos, viewport } => {
                self.interaction.drag_to(&mut self.transform, pos, viewport)
            }
            InputCommand::Release => {
                self.interaction.release();
                false
            }
            InputCommand::Reset => self.interaction.reset(&mut self.transform),
        };

        if changed {
            self.store.publish_parameters(&self.transform);
            self.redraw.request();
        }
    }

    fn report_frequency(&mut self, rate: Option<u32>) {
        self.last_frequency = rate;
        self.observer.on_frequency_change(rate);
    }

    /// Consume the pending redraw, if any.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.take()
    }

    /// Release the surface. Used when the viewer shuts down.
    pub fn teardown(&mut self) {
        self.store.teardown();
    }

    /// Current zoom/pan.
    #[must_use]
    pub fn transform(&self) -> TransformState {
        self.transform
    }

    /// Rows written since the last configure.
    #[must_use]
    pub fn total_lines(&self) -> u64 {
        self.store.total_lines()
    }

    /// Geometry of the current surface.
    #[must_use]
    pub fn geometry(&self) -> Option<StreamGeometry> {
        self.store.geometry()
    }

    /// Whether rows can be ingested.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Whether the transport is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Last reported line rate.
    #[must_use]
    pub fn frequency(&self) -> Option<u32> {
        self.last_frequency
    }

    /// Rows rejected for a wrong payload length.
    #[must_use]
    pub fn dropped_rows(&self) -> u64 {
        self.dropped_rows
    }

    /// The ring store, for read access.
    pub fn store(&self) -> &RingBufferStore<D> {
        &self.store
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The observer, mutably.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }
}
