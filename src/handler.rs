use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::warn;

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Apply a single editing key to a text buffer and its char cursor.
/// Returns `false` if the key isn't an editing key.
fn edit_line(buffer: &mut String, cursor: &mut usize, code: KeyCode) -> bool {
    let char_count = buffer.chars().count();
    *cursor = (*cursor).min(char_count);

    match code {
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(buffer, *cursor);
            buffer.insert(byte_pos, c);
            *cursor += 1;
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(buffer, *cursor);
                buffer.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(buffer, *cursor);
                buffer.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_count),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_count,
        _ => return false,
    }
    true
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick().await,
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_name_input {
        handle_name_input(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => match app.screen {
            Screen::Chat => handle_chat_editing(app, key),
            Screen::Image => handle_image_editing(app, key),
        },
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    app.status = None;

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => {
            app.screen = match app.screen {
                Screen::Chat => Screen::Image,
                Screen::Image => Screen::Chat,
            };
        }
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('c') => app.cycle_creativity(),
        KeyCode::Char('n') => app.open_name_input(),
        KeyCode::Char('u') => app.quick_inspiration(),
        KeyCode::Char('x') => app.clear_conversation(),
        _ => match app.screen {
            Screen::Chat => handle_chat_normal(app, key),
            Screen::Image => handle_image_normal(app, key),
        },
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(2) / 2),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(2) / 2),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        _ => {}
    }
}

fn handle_image_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('d') => app.clear_image(),
        KeyCode::Char('s') => match app.download_image() {
            Ok(path) => app.status = Some(format!("Saved to {}", path.display())),
            Err(e) => {
                warn!("Download failed: {e}");
                app.status = Some(e.to_string());
            }
        },
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            // Stays in editing mode so the next message can be typed right away
            app.send_chat();
        }
        code => {
            edit_line(app.session.input_mut(), &mut app.chat_cursor, code);
        }
    }
}

fn handle_image_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            if app.generate_image() {
                app.input_mode = InputMode::Normal;
            }
        }
        code => {
            edit_line(app.images.prompt_mut(), &mut app.image_cursor, code);
        }
    }
}

fn handle_name_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_name_input(),
        KeyCode::Enter => app.commit_name_input(),
        code => {
            edit_line(&mut app.name_input, &mut app.name_cursor, code);
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Chat {
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
    use crate::chat::{ChatBackend, ChatError};
    use crate::creativity::Creativity;
    use crate::image::{ImageStudio, PlaceholderImages};
    use crate::session::Session;
    use crate::state::Speaker;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixed;

    #[async_trait]
    impl ChatBackend for Fixed {
        async fn reply(&self, _message: &str, _creativity: Creativity) -> Result<String, ChatError> {
            Ok("Hi there!".to_string())
        }
    }

    fn test_app() -> App {
        App::new(
            Session::new(Arc::new(Fixed)),
            ImageStudio::new(Arc::new(PlaceholderImages::new(Duration::ZERO))),
            String::new(),
        )
    }

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, press(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[test]
    fn test_edit_line_is_utf8_safe() {
        let mut buffer = String::from("héllo");
        let mut cursor = 2;

        edit_line(&mut buffer, &mut cursor, KeyCode::Backspace);
        assert_eq!(buffer, "hllo");
        assert_eq!(cursor, 1);

        edit_line(&mut buffer, &mut cursor, KeyCode::Char('ö'));
        assert_eq!(buffer, "höllo");

        edit_line(&mut buffer, &mut cursor, KeyCode::End);
        edit_line(&mut buffer, &mut cursor, KeyCode::Delete);
        assert_eq!(buffer, "höllo");
        assert!(!edit_line(&mut buffer, &mut cursor, KeyCode::F(1)));
    }

    #[tokio::test]
    async fn test_typing_and_enter_submits_chat() {
        let mut app = test_app();
        handle_event(&mut app, press(KeyCode::Char('i'))).await.unwrap();
        type_text(&mut app, "Hello").await;
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.session.input(), "");
        assert_eq!(app.chat_cursor, 0);
        assert!(app.session.is_pending());

        app.session.settle().await;
        let turns = app.session.turns();
        assert_eq!(turns[0].speaker, Speaker::User);
        assert_eq!(turns[0].text, "Hello");
        assert_eq!(turns[1].text, "Hi there!");
    }

    #[tokio::test]
    async fn test_enter_on_blank_input_does_nothing() {
        let mut app = test_app();
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();
        type_text(&mut app, "   ").await;
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert!(app.session.turns().is_empty());
        assert!(!app.session.is_pending());
    }

    #[tokio::test]
    async fn test_normal_mode_shortcuts() {
        let mut app = test_app();

        handle_event(&mut app, press(KeyCode::Char('c'))).await.unwrap();
        assert_eq!(app.creativity(), Creativity::Focused);

        handle_event(&mut app, press(KeyCode::Char('u'))).await.unwrap();
        assert_eq!(app.session.turns().len(), 1);

        handle_event(&mut app, press(KeyCode::Char('x'))).await.unwrap();
        assert!(app.session.turns().is_empty());

        handle_event(&mut app, press(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.screen, Screen::Image);

        handle_event(&mut app, press(KeyCode::Char('q'))).await.unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_image_prompt_generates_on_enter() {
        let mut app = test_app();
        app.screen = Screen::Image;

        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();
        type_text(&mut app, "a lighthouse").await;
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.images.is_pending());

        app.images.settle().await;
        assert!(app.images.reference().is_some());

        handle_event(&mut app, press(KeyCode::Char('d'))).await.unwrap();
        assert!(app.images.reference().is_none());
        assert_eq!(app.images.prompt(), "");
    }

    #[tokio::test]
    async fn test_name_popup_captures_keys() {
        let mut app = test_app();
        handle_event(&mut app, press(KeyCode::Char('n'))).await.unwrap();
        assert!(app.show_name_input);

        // 'q' is text here, not quit
        type_text(&mut app, "qi").await;
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert!(!app.should_quit);
        assert_eq!(app.username, "qi");
        assert_eq!(app.user_label(), "qi");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_editing() {
        let mut app = test_app();
        app.input_mode = InputMode::Editing;
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c).await.unwrap();
        assert!(app.should_quit);
    }
}
