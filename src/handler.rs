use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode, Popup};
use crate::controller::Effect;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Applies one event to the app and returns the effects the runtime should spawn
pub fn handle_event(app: &mut App, event: AppEvent) -> Vec<Effect> {
    let mut effects = Vec::new();
    match event {
        AppEvent::Key(key) => handle_key(app, key, &mut effects),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Completion(completion) => app.controller.apply(completion),
    }
    app.sync_scroll();
    effects
}

fn handle_key(app: &mut App, key: KeyEvent, effects: &mut Vec<Effect>) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.popup {
        Popup::ModePicker => {
            handle_mode_picker(app, key, effects);
            return;
        }
        Popup::ModelPicker => {
            handle_model_picker(app, key);
            return;
        }
        Popup::ServerAddress => {
            handle_address_editor(app, key);
            return;
        }
        Popup::None => {}
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key, effects),
        InputMode::Editing => handle_editing_mode(app, key, effects),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent, effects: &mut Vec<Effect>) {
    app.status = None;
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.controller.input().chars().count();
        }

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(2) / 2),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(2) / 2),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_chat_to_top(),

        KeyCode::Char('b') => app.open_mode_picker(),
        KeyCode::Char('m') => app.open_model_picker(),
        KeyCode::Char('s') => app.open_address_editor(),
        KeyCode::Char('r') => match app.controller.refresh_local_models() {
            Some(effect) => {
                app.set_status("Liste des modèles en cours de rafraîchissement...");
                effects.push(effect);
            }
            None => app.set_status("La liste des modèles ne concerne que le mode local"),
        },

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent, effects: &mut Vec<Effect>) {
    // The input is read-only while a reply is pending
    let busy = app.controller.is_busy();

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if let Some(effect) = app.controller.submit_input() {
                app.input_cursor = 0;
                app.status = None;
                effects.push(effect);
            }
        }
        KeyCode::Backspace if !busy => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let input = app.controller.input_mut();
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete if !busy => {
            let cursor = app.input_cursor;
            let input = app.controller.input_mut();
            if cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.controller.input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.controller.input().chars().count();
        }
        KeyCode::Char(c) if !busy => {
            let cursor = app.input_cursor;
            let input = app.controller.input_mut();
            let byte_pos = char_to_byte_index(input, cursor);
            input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_mode_picker(app: &mut App, key: KeyEvent, effects: &mut Vec<Effect>) {
    match key.code {
        KeyCode::Esc => app.popup = Popup::None,
        KeyCode::Char('j') | KeyCode::Down => app.mode_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.mode_picker_nav_up(),
        KeyCode::Enter => effects.extend(app.select_mode()),
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.popup = Popup::None,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

fn handle_address_editor(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.popup = Popup::None;
            app.address_input.clear();
            app.address_cursor = 0;
        }
        KeyCode::Enter => app.confirm_address(),
        KeyCode::Backspace => {
            if app.address_cursor > 0 {
                app.address_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.address_input, app.address_cursor);
                app.address_input.remove(byte_pos);
            }
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.address_input, app.address_cursor);
            app.address_input.insert(byte_pos, c);
            app.address_cursor += 1;
        }
        KeyCode::Left => {
            app.address_cursor = app.address_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.address_input.chars().count();
            app.address_cursor = (app.address_cursor + 1).min(char_count);
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendConfig, BackendMode};
    use crate::controller::Completion;
    use crossterm::event::KeyEventKind;

    fn app() -> App {
        App::new(BackendConfig::new(
            BackendMode::Hosted,
            "http://localhost:11434",
            "proutgpt:latest",
            vec!["m1".to_string()],
        ))
    }

    fn press(app: &mut App, code: KeyCode) -> Vec<Effect> {
        let key = KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press);
        handle_event(app, AppEvent::Key(key))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn char_index_handles_multibyte() {
        assert_eq!(char_to_byte_index("été", 1), 2);
        assert_eq!(char_to_byte_index("été", 10), "été".len());
    }

    #[test]
    fn typing_then_enter_dispatches() {
        let mut app = app();
        type_text(&mut app, "blagué?");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.controller.input(), "blagu?");

        let effects = press(&mut app, KeyCode::Enter);
        assert_eq!(effects.len(), 1);
        assert!(app.controller.is_busy());
        assert_eq!(app.controller.input(), "");
        assert_eq!(app.input_cursor, 0);
    }

    #[test]
    fn enter_on_blank_input_does_nothing() {
        let mut app = app();
        type_text(&mut app, "   ");
        assert!(press(&mut app, KeyCode::Enter).is_empty());
        assert!(!app.controller.is_busy());
        assert_eq!(app.controller.conversation().len(), 1);
    }

    #[test]
    fn typing_is_ignored_while_busy() {
        let mut app = app();
        type_text(&mut app, "un");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "deux");
        assert_eq!(app.controller.input(), "");
        assert!(press(&mut app, KeyCode::Enter).is_empty());

        handle_event(&mut app, AppEvent::Completion(Completion::Reply(Ok("ok".to_string()))));
        assert!(!app.controller.is_busy());
        assert_eq!(app.controller.conversation().len(), 3);
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut app = app();
        app.open_mode_picker();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_event(&mut app, AppEvent::Key(key));
        assert!(app.should_quit);
    }

    #[test]
    fn refresh_in_hosted_mode_only_sets_status() {
        let mut app = app();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(press(&mut app, KeyCode::Char('r')).is_empty());
        assert!(app.status.is_some());
    }
}
