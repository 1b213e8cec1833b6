use ratatui::layout::Rect;
use ratatui::widgets::ListState;

use crate::backend::{BackendConfig, BackendMode};
use crate::controller::{ChatController, Effect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Overlay currently drawn above the chat, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    ModePicker,
    ModelPicker,
    ServerAddress,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub popup: Popup,

    pub controller: ChatController,
    // Cursor is a char index into the controller's input buffer
    pub input_cursor: usize,

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_area: Option<Rect>,
    seen_turns: usize,
    // Pin the view to the last line on the next draw
    follow_tail: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub mode_picker_state: ListState,
    pub model_picker_state: ListState,

    pub address_input: String,
    pub address_cursor: usize,

    /// One-line feedback shown in the footer
    pub status: Option<String>,
}

impl App {
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            popup: Popup::None,

            controller: ChatController::new(backend),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            seen_turns: 1,
            follow_tail: true,

            animation_frame: 0,

            mode_picker_state: ListState::default(),
            model_picker_state: ListState::default(),

            address_input: String::new(),
            address_cursor: 0,

            status: None,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Follows the tail whenever a turn was appended since the last call
    pub fn sync_scroll(&mut self) {
        let len = self.controller.conversation().len();
        if len != self.seen_turns {
            self.seen_turns = len;
            self.scroll_chat_to_bottom();
        }
    }

    /// Scroll chat to bottom so the latest turn (or "réfléchit...") is visible.
    ///
    /// The offset itself is resolved by the renderer, which knows how the
    /// paragraph wraps at the current width.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.follow_tail = false;
        self.chat_scroll = 0;
    }

    pub fn follows_tail(&self) -> bool {
        self.follow_tail
    }

    /// Called by the renderer with the wrapped height of the chat
    pub fn clamp_chat_scroll(&mut self, max_scroll: u16) {
        if self.follow_tail {
            self.chat_scroll = max_scroll;
        } else {
            self.chat_scroll = self.chat_scroll.min(max_scroll);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    // Mode picker methods
    pub fn open_mode_picker(&mut self) {
        let current = self.controller.backend().mode();
        let idx = BackendMode::all().iter().position(|m| *m == current);
        self.mode_picker_state.select(idx.or(Some(0)));
        self.popup = Popup::ModePicker;
    }

    pub fn mode_picker_nav_down(&mut self) {
        let len = BackendMode::all().len();
        let i = self.mode_picker_state.selected().unwrap_or(0);
        self.mode_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn mode_picker_nav_up(&mut self) {
        let i = self.mode_picker_state.selected().unwrap_or(0);
        self.mode_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_mode(&mut self) -> Option<Effect> {
        let mode = self
            .mode_picker_state
            .selected()
            .and_then(|i| BackendMode::all().get(i).copied())?;
        self.popup = Popup::None;
        let effect = self.controller.set_mode(mode);
        self.set_status(format!("Mode : {}", mode.display_name()));
        effect
    }

    // Model picker methods
    pub fn open_model_picker(&mut self) {
        let backend = self.controller.backend();
        if backend.active_models().is_empty() {
            self.set_status("Aucun modèle disponible (r pour rafraîchir la liste)");
            return;
        }
        let idx = backend
            .active_models()
            .iter()
            .position(|m| m == backend.model_id());
        self.model_picker_state.select(idx.or(Some(0)));
        self.popup = Popup::ModelPicker;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.controller.backend().active_models().len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        let Some(model) = self
            .model_picker_state
            .selected()
            .and_then(|i| self.controller.backend().active_models().get(i).cloned())
        else {
            return;
        };
        self.popup = Popup::None;
        match self.controller.set_model_id(&model) {
            Ok(()) => self.set_status(format!("Modèle : {model}")),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // Server address editor
    pub fn open_address_editor(&mut self) {
        if self.controller.backend().mode() != BackendMode::Local {
            self.set_status("L'adresse du serveur ne s'applique qu'au mode local");
            return;
        }
        self.address_input = self.controller.backend().server_address().to_string();
        self.address_cursor = self.address_input.chars().count();
        self.popup = Popup::ServerAddress;
    }

    pub fn confirm_address(&mut self) {
        let addr = std::mem::take(&mut self.address_input);
        self.address_cursor = 0;
        self.popup = Popup::None;
        match self.controller.set_server_address(&addr) {
            Ok(()) => self.set_status(format!(
                "Serveur : {} (r pour rafraîchir les modèles)",
                self.controller.backend().server_address()
            )),
            Err(e) => self.set_status(e.to_string()),
        }
    }
}
