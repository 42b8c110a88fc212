//! Message list component
//!
//! Displays the conversation as chat bubbles, newest at the bottom.

use crate::llm::PLACEHOLDER;
use crate::messages::{Message, Role};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText, Vec2};

/// Message list component
pub struct MessageList<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing);

                for message in self.state.messages.iter() {
                    self.show_message(ui, message);
                    ui.add_space(self.theme.spacing_sm);
                }

                if let Some(error) = &self.state.error {
                    self.show_error(ui, error);
                }

                ui.add_space(self.theme.spacing);
            });
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &Message) {
        let is_user = message.is_user();
        let (bubble_color, text_color, align, label_prefix) = match message.role {
            Role::User => (
                self.theme.user_bubble,
                Color32::WHITE,
                Align::RIGHT,
                "User message",
            ),
            Role::Model => (
                self.theme.model_bubble,
                self.theme.text_primary,
                Align::LEFT,
                "Model message",
            ),
        };

        let layout = if is_user {
            egui::Layout::right_to_left(Align::Min)
        } else {
            egui::Layout::left_to_right(Align::Min)
        };

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            ui.with_layout(layout, |ui| {
                self.show_avatar(ui, message.role);

                let max_width = ui.available_width() * 0.75;
                egui::Frame::none()
                    .fill(bubble_color)
                    .rounding(self.theme.bubble_rounding)
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                    .show(ui, |ui| {
                        ui.set_max_width(max_width);

                        let pending = !is_user
                            && self.state.is_loading
                            && message.content == PLACEHOLDER;
                        let response = if pending {
                            self.show_typing(ui)
                        } else {
                            ui.label(RichText::new(&message.content).color(text_color))
                        };

                        let label = format!("{}: {}", label_prefix, message.content);
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                        });
                    });
            });

            ui.label(
                RichText::new(message.timestamp.format("%H:%M").to_string())
                    .size(10.0)
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_avatar(&self, ui: &mut egui::Ui, role: Role) {
        let (icon, fill) = match role {
            Role::User => ("👤", self.theme.bg_tertiary),
            Role::Model => ("✨", self.theme.primary),
        };
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(28.0), egui::Sense::hover());
        ui.painter().circle_filled(rect.center(), 14.0, fill);
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            icon,
            egui::FontId::proportional(14.0),
            Color32::WHITE,
        );
    }

    fn show_typing(&self, ui: &mut egui::Ui) -> egui::Response {
        let t = ui.ctx().input(|i| i.time);
        let response = ui
            .horizontal(|ui| {
                for i in 0..3 {
                    let alpha = ((t * 3.0 + i as f64 * 0.5).sin() * 0.5 + 0.5) as f32;
                    ui.label(
                        RichText::new("●")
                            .size(10.0)
                            .color(self.theme.text_muted.gamma_multiply(alpha)),
                    );
                }
            })
            .response;
        ui.ctx().request_repaint();
        response
    }

    fn show_error(&self, ui: &mut egui::Ui, error: &str) {
        egui::Frame::none()
            .fill(self.theme.error.gamma_multiply(0.15))
            .stroke(egui::Stroke::new(1.0, self.theme.error))
            .rounding(self.theme.button_rounding)
            .inner_margin(egui::Margin::symmetric(12.0, 8.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let label = format!("Error: {}", error);
                ui.label(RichText::new(&label).color(self.theme.error))
                    .widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                    });
            });
    }
}
