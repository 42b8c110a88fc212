//! Input bar component
//!
//! Mic toggle, multi-line text box and send button.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, Modifiers, RichText, Vec2};

pub const INPUT_HINT: &str = "Type your message or use the mic...";
pub const LISTENING_HINT: &str = "Listening...";

/// Input bar component for text and voice input
pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        if let Some(error) = self.state.speech.error() {
            let error = error.to_string();
            ui.label(RichText::new(&error).size(12.0).color(self.theme.error))
                .widget_info(|| {
                    egui::WidgetInfo::labeled(
                        egui::WidgetType::Label,
                        true,
                        format!("Microphone error: {}", error),
                    )
                });
            ui.add_space(self.theme.spacing_sm / 2.0);
        }

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_mic_button(ui);
                    self.show_text_input(ui);
                    self.show_send_button(ui);
                });
            });
    }

    fn show_mic_button(&mut self, ui: &mut egui::Ui) {
        let listening = self.state.speech.is_listening();
        let (icon, label, color) = if listening {
            ("⏹", "Stop recording", self.theme.recording)
        } else {
            ("🎤", "Start recording", self.theme.text_secondary)
        };

        let mut button = egui::Button::new(RichText::new(icon).size(18.0).color(color))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding);
        if listening {
            button = button.fill(self.theme.recording.gamma_multiply(0.2));
        }

        let enabled = listening || !self.state.is_loading;
        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, label));

        if listening {
            let t = ui.ctx().input(|i| i.time);
            let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;
            ui.painter().circle_stroke(
                response.rect.center(),
                response.rect.width() / 2.0 + 2.0 + pulse * 3.0,
                egui::Stroke::new(2.0 * pulse, self.theme.recording.gamma_multiply(1.0 - pulse * 0.5)),
            );
            ui.ctx().request_repaint();
        }

        if response.on_hover_text(label).clicked() {
            self.state.toggle_speech();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let id = egui::Id::new("message_input");
        let enabled = self.state.input_enabled();
        let hint = if self.state.speech.is_listening() {
            LISTENING_HINT
        } else {
            INPUT_HINT
        };

        // Enter submits; Shift+Enter falls through to the text box as a newline
        let submit = enabled
            && ui.memory(|m| m.has_focus(id))
            && !ui.input(|i| i.modifiers.shift)
            && ui.input_mut(|i| i.consume_key(Modifiers::NONE, Key::Enter));

        let text_edit = egui::TextEdit::multiline(&mut self.state.input_text)
            .id(id)
            .hint_text(hint)
            .desired_rows(1)
            .desired_width(ui.available_width() - 52.0)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(10.0, 8.0));

        let response = ui.add_enabled(enabled, text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, enabled, "Message input")
        });

        if response.changed() {
            self.state.speech.clear_error();
        }

        if submit && self.state.submit_input() {
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        if self.state.is_loading {
            ui.add_sized(Vec2::splat(40.0), egui::Spinner::new())
                .widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Other, true, "Waiting for reply")
                });
            return;
        }

        let enabled = self.state.send_enabled();
        let fill = if enabled {
            self.theme.primary
        } else {
            self.theme.bg_tertiary
        };

        let button = egui::Button::new(RichText::new("➤").size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Send message")
        });

        if response.on_hover_text("Send message (Enter)").clicked() {
            self.state.submit_input();
        }
    }
}
