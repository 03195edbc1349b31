//! Image requests.
//!
//! There is no real generation backend yet. [`PlaceholderImages`] waits a
//! moment and hands back a deterministic placeholder reference derived from
//! the prompt; swapping in a real service means implementing [`ImageBackend`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_PLACEHOLDER_DELAY: Duration = Duration::from_millis(2000);

#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Produce a reference (path or URL) to an image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ImageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Image generation failed: {0}")]
    Generation(String),
    #[error("Image task did not complete: {0}")]
    Task(String),
}

/// Build the placeholder reference for a prompt.
pub fn placeholder_reference(prompt: &str) -> String {
    format!(
        "/placeholder.svg?height=512&width=512&query={}",
        encode_query_component(prompt)
    )
}

/// Percent-encode everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, so a space
/// becomes `%20` rather than `+`.
fn encode_query_component(value: &str) -> String {
    // `%` itself is encoded as %25, so these sequences can only come from
    // the marks being restored
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

#[derive(Debug, Clone)]
pub struct PlaceholderImages {
    delay: Duration,
}

impl PlaceholderImages {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for PlaceholderImages {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_DELAY)
    }
}

#[async_trait]
impl ImageBackend for PlaceholderImages {
    async fn generate(&self, prompt: &str) -> Result<String, ImageError> {
        tokio::time::sleep(self.delay).await;
        Ok(placeholder_reference(prompt))
    }
}

/// Staged prompt, the last produced reference, and the single in-flight request.
pub struct ImageStudio {
    prompt: String,
    reference: Option<String>,
    backend: Arc<dyn ImageBackend>,
    in_flight: Option<JoinHandle<Result<String, ImageError>>>,
}

impl ImageStudio {
    pub fn new(backend: Arc<dyn ImageBackend>) -> Self {
        Self {
            prompt: String::new(),
            reference: None,
            backend,
            in_flight: None,
        }
    }

    /// Start generating from the staged prompt. No-op on a blank prompt or
    /// while a request is outstanding. The prompt stays staged.
    pub fn generate(&mut self) -> bool {
        if self.prompt.trim().is_empty() || self.is_pending() {
            return false;
        }

        let backend = Arc::clone(&self.backend);
        let prompt = self.prompt.clone();
        debug!(prompt = %prompt, "Requesting image");
        self.in_flight = Some(tokio::spawn(async move { backend.generate(&prompt).await }));
        true
    }

    pub async fn poll_image(&mut self) -> bool {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return false;
        }
        self.settle().await
    }

    pub async fn settle(&mut self) -> bool {
        let Some(task) = self.in_flight.take() else {
            return false;
        };

        let outcome = task
            .await
            .map_err(|e| ImageError::Task(e.to_string()))
            .and_then(|result| result);

        match outcome {
            Ok(reference) => {
                debug!(reference = %reference, "Image ready");
                self.reference = Some(reference);
            }
            Err(e) => warn!("{e}"),
        }
        true
    }

    /// Forget both the staged prompt and the current image.
    pub fn clear(&mut self) {
        self.prompt.clear();
        self.reference = None;
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut String {
        &mut self.prompt
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenBackend;

    #[async_trait]
    impl ImageBackend for BrokenBackend {
        async fn generate(&self, _prompt: &str) -> Result<String, ImageError> {
            Err(ImageError::Generation("model offline".to_string()))
        }
    }

    #[test]
    fn test_placeholder_reference_encodes_prompt() {
        assert_eq!(
            placeholder_reference("a red fox & moon"),
            "/placeholder.svg?height=512&width=512&query=a%20red%20fox%20%26%20moon"
        );
        assert_eq!(
            placeholder_reference("it's (50%) done! *~"),
            "/placeholder.svg?height=512&width=512&query=it's%20(50%25)%20done!%20*~"
        );
        assert_eq!(
            placeholder_reference("ñ+/?"),
            "/placeholder.svg?height=512&width=512&query=%C3%B1%2B%2F%3F"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_waits_for_delay() {
        let started = tokio::time::Instant::now();
        let reference = PlaceholderImages::default().generate("cat").await.unwrap();

        assert_eq!(reference, placeholder_reference("cat"));
        assert!(started.elapsed() >= DEFAULT_PLACEHOLDER_DELAY);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_ignored() {
        let mut studio = ImageStudio::new(Arc::new(PlaceholderImages::new(Duration::ZERO)));
        studio.prompt_mut().push_str("   ");

        assert!(!studio.generate());
        assert!(!studio.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_is_single_flight() {
        let mut studio = ImageStudio::new(Arc::new(PlaceholderImages::default()));
        studio.prompt_mut().push_str("mountain lake");

        assert!(studio.generate());
        assert!(!studio.generate());
        assert!(studio.is_pending());

        studio.settle().await;

        assert!(!studio.is_pending());
        assert_eq!(studio.reference(), Some(placeholder_reference("mountain lake").as_str()));
        assert_eq!(studio.prompt(), "mountain lake");
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_previous_reference() {
        let mut studio = ImageStudio::new(Arc::new(PlaceholderImages::new(Duration::ZERO)));
        studio.prompt_mut().push_str("first");
        studio.generate();
        studio.settle().await;
        let first = studio.reference().map(str::to_string);

        studio.backend = Arc::new(BrokenBackend);
        studio.generate();
        studio.settle().await;

        assert!(first.is_some());
        assert_eq!(studio.reference().map(str::to_string), first);
        assert!(!studio.is_pending());
    }

    #[tokio::test]
    async fn test_clear_drops_prompt_and_image() {
        let mut studio = ImageStudio::new(Arc::new(PlaceholderImages::new(Duration::ZERO)));
        studio.prompt_mut().push_str("sunset");
        studio.generate();
        studio.settle().await;

        studio.clear();

        assert_eq!(studio.prompt(), "");
        assert!(studio.reference().is_none());
    }
}
