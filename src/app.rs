use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::creativity::Creativity;
use crate::image::ImageStudio;
use crate::session::Session;

pub const INSPIRATION_MESSAGE: &str =
    "🌟 You are capable of amazing things. Keep going! Your potential is limitless.";

/// File the current image reference is written to by "download"
pub const DOWNLOAD_FILE_NAME: &str = "generated-image.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    pub session: Session,
    pub images: ImageStudio,

    // Optional display name for the user's turns
    pub username: String,
    pub show_name_input: bool,
    pub name_input: String,
    pub name_cursor: usize,

    // Cursor positions (in chars) for the chat and image input boxes
    pub chat_cursor: usize,
    pub image_cursor: usize,

    // Transcript viewport, updated during render
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    /// Set when the transcript grows; the next render scrolls to the bottom
    pub stick_to_bottom: bool,
    seen_turns: usize,

    pub animation_frame: u8,
    /// One-line feedback shown in the footer (e.g. after a download)
    pub status: Option<String>,

    download_dir: PathBuf,
}

impl App {
    pub fn new(session: Session, images: ImageStudio, username: String) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Chat,
            input_mode: InputMode::Normal,

            session,
            images,

            username,
            show_name_input: false,
            name_input: String::new(),
            name_cursor: 0,

            chat_cursor: 0,
            image_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            stick_to_bottom: false,
            seen_turns: 0,

            animation_frame: 0,
            status: None,

            download_dir: PathBuf::from("."),
        }
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Label for the user's turns
    pub fn user_label(&self) -> &str {
        let name = self.username.trim();
        if name.is_empty() {
            "You"
        } else {
            name
        }
    }

    /// Called on every tick: settle finished requests and keep the view current
    pub async fn tick(&mut self) {
        self.session.poll_reply().await;
        self.images.poll_image().await;

        if self.session.is_pending() || self.images.is_pending() {
            self.animation_frame = self.animation_frame.wrapping_add(1);
        }

        self.follow_transcript();
    }

    // Chat actions
    pub fn send_chat(&mut self) -> bool {
        let accepted = self.session.submit_staged();
        if accepted {
            self.chat_cursor = 0;
            self.follow_transcript();
        }
        accepted
    }

    pub fn quick_inspiration(&mut self) {
        self.session.inject_canned_message(INSPIRATION_MESSAGE);
        self.follow_transcript();
    }

    pub fn clear_conversation(&mut self) {
        self.session.reset();
        self.chat_cursor = 0;
        self.chat_scroll = 0;
        self.stick_to_bottom = false;
        self.seen_turns = 0;
    }

    pub fn cycle_creativity(&mut self) {
        let next = self.session.creativity().next();
        self.session.set_creativity(next);
        info!(creativity = next.as_str(), "Creativity changed");
    }

    pub fn creativity(&self) -> Creativity {
        self.session.creativity()
    }

    // Image actions
    pub fn generate_image(&mut self) -> bool {
        self.images.generate()
    }

    pub fn clear_image(&mut self) {
        self.images.clear();
        self.image_cursor = 0;
    }

    /// Write the current image reference to the download directory
    pub fn download_image(&mut self) -> Result<PathBuf> {
        let reference = self
            .images
            .reference()
            .ok_or_else(|| anyhow!("No image to download yet"))?;

        let path = self.download_dir.join(DOWNLOAD_FILE_NAME);
        std::fs::write(&path, format!("{}\n", reference))?;
        info!(path = %path.display(), "Saved image reference");
        Ok(path)
    }

    // Name popup
    pub fn open_name_input(&mut self) {
        self.name_input = self.username.clone();
        self.name_cursor = self.name_input.chars().count();
        self.show_name_input = true;
    }

    pub fn commit_name_input(&mut self) {
        self.username = self.name_input.trim().to_string();
        self.close_name_input();
    }

    pub fn close_name_input(&mut self) {
        self.show_name_input = false;
        self.name_input.clear();
        self.name_cursor = 0;
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn max_chat_scroll(&self) -> u16 {
        let width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let total = crate::ui::transcript_height(self, width);
        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };
        total.saturating_sub(visible)
    }

    /// Follow the transcript whenever it grows. The scroll itself waits
    /// for the next render, which knows the real viewport size.
    fn follow_transcript(&mut self) {
        let count = self.session.turns().len();
        if count != self.seen_turns {
            self.seen_turns = count;
            self.stick_to_bottom = true;
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatBackend, ChatError};
    use crate::image::PlaceholderImages;
    use crate::state::Speaker;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    struct Echo;

    #[async_trait]
    impl ChatBackend for Echo {
        async fn reply(&self, message: &str, _creativity: Creativity) -> Result<String, ChatError> {
            Ok(format!("echo: {}", message))
        }
    }

    fn test_app() -> App {
        App::new(
            Session::new(Arc::new(Echo)),
            ImageStudio::new(Arc::new(PlaceholderImages::new(Duration::ZERO))),
            String::new(),
        )
    }

    #[test]
    fn test_user_label_falls_back_to_you() {
        let mut app = test_app();
        assert_eq!(app.user_label(), "You");
        app.username = "  Grace ".to_string();
        assert_eq!(app.user_label(), "Grace");
    }

    #[tokio::test]
    async fn test_tick_settles_reply() {
        let mut app = test_app();
        app.session.input_mut().push_str("ping");
        assert!(app.send_chat());

        while app.session.is_pending() {
            app.tick().await;
            tokio::task::yield_now().await;
        }

        assert_eq!(app.session.turns()[1].text, "echo: ping");
    }

    #[tokio::test]
    async fn test_clear_conversation_resets_view() {
        let mut app = test_app();
        app.quick_inspiration();
        app.chat_scroll = 4;

        app.clear_conversation();

        assert!(app.session.turns().is_empty());
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_quick_inspiration_appends_canned_turn() {
        let mut app = test_app();
        app.quick_inspiration();

        let turns = app.session.turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].speaker, Speaker::Assistant);
        assert_eq!(turns[0].text, INSPIRATION_MESSAGE);
    }

    #[test]
    fn test_creativity_and_name_change_in_memory() {
        let mut app = test_app();

        app.cycle_creativity();
        app.open_name_input();
        app.name_input = " Lin ".to_string();
        app.commit_name_input();

        assert_eq!(app.creativity(), Creativity::Focused);
        assert_eq!(app.session.creativity(), Creativity::Focused);
        assert_eq!(app.username, "Lin");
        assert_eq!(app.user_label(), "Lin");
        assert!(!app.show_name_input);
    }

    #[test]
    fn test_new_turns_scroll_on_next_render() {
        let mut app = test_app();
        app.quick_inspiration();
        assert!(app.stick_to_bottom);

        app.clear_conversation();
        assert!(!app.stick_to_bottom);
    }

    #[tokio::test]
    async fn test_download_writes_reference() {
        let dir = tempdir().unwrap();
        let mut app = test_app().with_download_dir(dir.path());
        assert!(app.download_image().is_err());

        app.images.prompt_mut().push_str("owl");
        app.generate_image();
        app.images.settle().await;

        let path = app.download_image().unwrap();
        let saved = std::fs::read_to_string(path).unwrap();
        assert_eq!(saved.trim(), crate::image::placeholder_reference("owl"));
    }
}
