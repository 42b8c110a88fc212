//! Title bar with the new-chat control

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub const TITLE: &str = "Gemini Sampurana Chat";
pub const SUBTITLE: &str = "Powered by Google Gemini";

pub struct Header<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label(
                    RichText::new(TITLE)
                        .size(20.0)
                        .strong()
                        .color(self.theme.text_primary),
                );
                ui.label(
                    RichText::new(SUBTITLE)
                        .size(12.0)
                        .color(self.theme.text_muted),
                );
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let button = egui::Button::new("New chat").rounding(self.theme.button_rounding);
                let response = ui.add(button).on_hover_text("Start a new chat");
                if response.clicked() {
                    self.state.request_reset();
                }
            });
        });
    }
}

/// Modal confirmation shown before the conversation is cleared
pub struct ResetDialog<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> ResetDialog<'a> {
    pub const PROMPT: &'static str =
        "Are you sure you want to start a new chat? The current conversation will be cleared.";

    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ctx: &egui::Context) {
        if !self.state.confirm_reset {
            return;
        }

        let mut confirmed = false;
        let mut cancelled = false;

        egui::Window::new("Start a new chat")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(RichText::new(Self::PROMPT).color(self.theme.text_secondary));
                ui.add_space(self.theme.spacing_sm);
                ui.horizontal(|ui| {
                    if ui.button("Confirm").clicked() {
                        confirmed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            cancelled = true;
        }

        if confirmed {
            self.state.confirm_reset();
        } else if cancelled {
            self.state.cancel_reset();
        }
    }
}
