//! Main application state and UI logic.

use std::time::Instant;

use eframe::egui;
use scan_client::{
    resolve_address, AddressSource, SessionConfig, SessionHandle, SessionState, StreamAddress,
    StreamSession, WebSocketConnector, STORAGE_KEY_STREAM_ADDR,
};
use scan_core::{StreamEvent, ViewerConfig, ViewerObserver, ViewerState, STATUS_NO_ADAPTER};
use tokio::sync::mpsc;

use crate::gpu::GpuDevice;
use crate::input::CanvasInput;
use crate::layout::{self, colors};
use crate::render;
use crate::status::{format_frequency, format_zoom, UiStatus};
use crate::widgets::{RecordToggle, StatusBar};

const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_millis(500);

/// Startup options resolved by `main`.
#[derive(Debug, Clone, Default)]
pub struct ViewerOptions {
    /// Loaded and validated configuration.
    pub config: ViewerConfig,
    /// `--url` from the command line.
    pub url: Option<String>,
    /// Start recording immediately.
    pub record: bool,
}

/// Main application state
pub struct LineScanApp {
    /// Tokio runtime for the streaming session
    runtime: tokio::runtime::Runtime,

    /// Control handle of the streaming session
    session: SessionHandle,

    /// Session events, forwarded by the repaint pump
    events: mpsc::UnboundedReceiver<StreamEvent>,

    /// Ring, transform and estimator; the only place they are mutated
    viewer: ViewerState<GpuDevice, UiStatus>,

    /// Validated stream address
    address: StreamAddress,

    /// Text input field for the address (may be invalid during editing)
    address_input: String,

    /// Address validation error (shown in UI)
    address_error: Option<String>,

    /// Record toggle state
    recording: bool,

    status_bar: StatusBar,
}

impl LineScanApp {
    /// Build the app: runtime, GPU device, session.
    pub fn new(cc: &eframe::CreationContext<'_>, options: ViewerOptions) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("line-scan-io")
            .build()?;

        let persisted = cc.storage.and_then(load_stream_address);
        let user_url = options.url.or_else(|| options.config.stream.url.clone());
        let address = resolve_address(user_url.as_deref(), persisted.as_deref());
        tracing::info!(url = %address, source = %address.source(), "Stream address resolved");

        let device = GpuDevice::new(cc.wgpu_render_state.clone());
        let gpu_available = device.is_available();
        let mut viewer = ViewerState::new(
            device,
            UiStatus::default(),
            options.config.zoom_limits(),
        );
        if !gpu_available {
            viewer.observer_mut().on_status_change(STATUS_NO_ADAPTER);
        }

        let session_config = SessionConfig {
            reconnect_delay: options.config.reconnect_delay(),
            default_max_lines: options.config.display.default_max_lines,
        };
        let (session, raw_events) = StreamSession::spawn(
            WebSocketConnector,
            address.clone(),
            session_config,
            runtime.handle(),
        );
        let events = spawn_repaint_pump(&runtime, raw_events, cc.egui_ctx.clone());

        if options.record {
            session.activate();
        }

        Ok(Self {
            runtime,
            session,
            events,
            viewer,
            address_input: address.original().to_string(),
            address,
            address_error: None,
            recording: options.record,
            status_bar: StatusBar::new(),
        })
    }

    /// Apply everything the session produced since the last frame.
    ///
    /// Runs only while egui paints. A hidden window leaves rows queued in
    /// the channel until the next frame, where they are applied in order.
    fn drain_events(&mut self) {
        let now = Instant::now();
        let mut rows = 0usize;
        while let Ok(event) = self.events.try_recv() {
            if matches!(event, StreamEvent::Row(_)) {
                rows += 1;
            }
            self.viewer.apply(event.into(), now);
        }
        if rows > 1 {
            tracing::trace!(rows, "Coalesced rows into one frame");
        }
    }

    fn set_recording(&mut self, recording: bool) {
        if recording {
            tracing::info!(url = %self.address, "Recording started");
            self.session.activate();
        } else {
            tracing::info!(lines = self.viewer.total_lines(), "Recording stopped");
            self.session.deactivate();
        }
    }

    /// Validate the address field and hand it to the session.
    fn apply_address(&mut self) {
        match StreamAddress::parse(&self.address_input, AddressSource::UserInput) {
            Ok(address) => {
                if address != self.address {
                    tracing::info!(url = %address, "Stream address changed");
                    self.session.set_address(address.clone());
                    self.address = address;
                }
                self.address_error = None;
            }
            Err(e) => {
                tracing::warn!(input = %self.address_input, error = %e, "Invalid stream address");
                self.address_error = Some(e.to_string());
            }
        }
    }

    /// Render the canvas controls bar
    fn render_controls(&mut self, ctx: &egui::Context, session: SessionState) {
        egui::TopBottomPanel::top("canvas_controls")
            .exact_height(layout::CONTROLS_HEIGHT)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let mut recording = self.recording;
                    if ui.add(RecordToggle::new(&mut recording)).changed() {
                        self.recording = recording;
                        self.set_recording(recording);
                    }

                    ui.separator();
                    ui.label("Stream:");
                    ui.label(
                        egui::RichText::new(format!("[{}]", self.address.source().label()))
                            .small()
                            .color(colors::MUTED),
                    )
                    .on_hover_text(format!("Source: {}", self.address.source()));

                    let mut text_edit = egui::TextEdit::singleline(&mut self.address_input)
                        .hint_text(scan_client::DEFAULT_STREAM_URL);
                    if self.address_error.is_some() {
                        text_edit = text_edit.text_color(colors::ERROR);
                    }
                    let response = ui.add_sized([layout::URL_FIELD_WIDTH, 18.0], text_edit);
                    let enter_pressed =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    response.on_hover_text(format!("Resolved: {}", self.address.as_str()));
                    if enter_pressed || ui.button("Apply").clicked() {
                        self.apply_address();
                    }
                    if let Some(err) = &self.address_error {
                        ui.colored_label(colors::ERROR, err);
                    }

                    if session == SessionState::Connecting {
                        ui.spinner();
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!("Zoom {}", format_zoom(self.viewer.transform().zoom)));
                        ui.separator();
                        ui.label(format!("Lines scanned: {}", self.viewer.total_lines()));
                        ui.separator();
                        ui.label(format_frequency(self.viewer.frequency()));
                    });
                });
            });
    }

    /// Render the scan canvas and feed its input to the viewer
    fn render_canvas(&mut self, ui: &mut egui::Ui) {
        let size = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());

        let input = CanvasInput::from_response(ui, &response);
        let now = Instant::now();
        for command in input.commands(rect) {
            self.viewer.apply(command.into(), now);
        }

        if self.viewer.is_ready() {
            ui.painter().add(render::paint_callback(rect));
        } else {
            let hint = if self.recording {
                "Waiting for stream geometry..."
            } else {
                "Press Record to start streaming"
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                hint,
                egui::FontId::proportional(16.0),
                colors::MUTED,
            );
        }

        // This frame carries the latest parameters.
        if self.viewer.take_redraw() {
            tracing::trace!(total_lines = self.viewer.total_lines(), "Canvas redrawn");
        }
    }
}

impl eframe::App for LineScanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        let session = self.session.state();

        self.render_controls(ctx, session);
        self.status_bar.show(ctx, session, self.viewer.observer());

        egui::CentralPanel::default()
            .frame(layout::canvas_frame().inner_margin(layout::PANEL_PADDING))
            .show(ctx, |ui| self.render_canvas(ui));

        // State labels change without stream events while reconnecting.
        if session.is_active() && !self.viewer.is_connected() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if self.viewer.is_connected() {
            save_stream_address(storage, &self.address);
        }
    }
}

impl Drop for LineScanApp {
    fn drop(&mut self) {
        tracing::debug!("LineScanApp shutting down");
        self.session.shutdown();
        // Let the session send stop and close before the runtime goes away.
        let mut state = self.session.subscribe();
        let _ = self.runtime.block_on(tokio::time::timeout(
            SHUTDOWN_GRACE,
            state.wait_for(|s| *s == SessionState::Idle),
        ));
        self.viewer.teardown();
    }
}

/// Forward session events to the UI thread, waking egui for each one.
///
/// egui folds repaint requests made before the next frame into that frame,
/// so bursts of rows cost one paint.
fn spawn_repaint_pump(
    runtime: &tokio::runtime::Runtime,
    mut events: mpsc::UnboundedReceiver<StreamEvent>,
    ctx: egui::Context,
) -> mpsc::UnboundedReceiver<StreamEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    runtime.spawn(async move {
        while let Some(event) = events.recv().await {
            if tx.send(event).is_err() {
                break;
            }
            ctx.request_repaint();
        }
    });
    rx
}

/// Persist the stream address to eframe storage.
pub fn save_stream_address(storage: &mut dyn eframe::Storage, address: &StreamAddress) {
    storage.set_string(STORAGE_KEY_STREAM_ADDR, address.as_str().to_string());
}

/// Load the persisted stream address string from storage.
pub fn load_stream_address(storage: &dyn eframe::Storage) -> Option<String> {
    storage.get_string(STORAGE_KEY_STREAM_ADDR)
}
