//! Main application struct and eframe integration

use crate::config::AppConfig;
use crate::llm::{LLMCommand, LLMPipeline};
use crate::speech::{default_recognizer, SpeechSession};
use crate::ui::components::{Header, InputBar, MessageList, ResetDialog};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use crate::utils::RepaintSignal;
use crossbeam_channel::Sender;
use egui::{self, CentralPanel, TopBottomPanel};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

/// The chat window
pub struct SampuranaApp {
    state: AppState,
    theme: Theme,
    llm_command_tx: Sender<LLMCommand>,
    llm_worker: Option<JoinHandle<()>>,
}

impl SampuranaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        let repaint = RepaintSignal::new();
        let ctx = cc.egui_ctx.clone();
        repaint.set(Arc::new(move || ctx.request_repaint()));

        let pipeline = LLMPipeline::new(config.chat.clone(), repaint.clone());
        let llm_command_tx = pipeline.command_sender();
        let llm_event_rx = pipeline.event_receiver();
        let llm_worker = match pipeline.start_worker() {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Failed to start chat pipeline: {}", e);
                None
            }
        };

        let speech = SpeechSession::new(default_recognizer(&config.speech), repaint);
        let mut state = AppState::new(config.chat.greeting.clone(), speech);
        state.connect(llm_command_tx.clone(), llm_event_rx);
        state.initialize_chat();

        info!("Sampurana UI initialized");

        Self {
            state,
            theme,
            llm_command_tx,
            llm_worker,
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                Header::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing, 0.0)),
            )
            .show(ctx, |ui| {
                MessageList::new(&self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for SampuranaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_events();

        self.show_header(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);
        ResetDialog::new(&mut self.state, &self.theme).show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Sampurana shutting down");
        self.state.speech.stop();
        let _ = self.llm_command_tx.send(LLMCommand::Shutdown);
        // The worker may be mid-stream; leave it to finish on its own
        if let Some(worker) = self.llm_worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            }
        }
    }
}
