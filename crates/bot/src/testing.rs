//! In-memory fakes for the transport and camera.
//!
//! Compiled for unit tests and for other crates through the `test-support`
//! feature.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use watchpost_core::{PromptId, SubscriberId};

use crate::hardware::{Camera, CameraError};
use crate::transport::{Keyboard, Transport, TransportError};

/// A prompt recorded by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPrompt {
    /// Recipient.
    pub to: SubscriberId,
    /// Id handed back to the caller.
    pub prompt: PromptId,
    /// Prompt text.
    pub text: String,
    /// Buttons.
    pub keyboard: Keyboard,
}

/// A prompt edit recorded by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEdit {
    /// Recipient.
    pub to: SubscriberId,
    /// Edited prompt.
    pub prompt: PromptId,
    /// New text.
    pub text: String,
    /// New buttons, `None` when removed.
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Default)]
struct Outbox {
    texts: Vec<(SubscriberId, String)>,
    prompts: Vec<SentPrompt>,
    edits: Vec<PromptEdit>,
    videos: Vec<(SubscriberId, PathBuf)>,
}

/// Transport that records everything it is asked to send.
#[derive(Debug, Default)]
pub struct FakeTransport {
    outbox: Mutex<Outbox>,
    failing: Mutex<HashSet<SubscriberId>>,
    next_prompt: AtomicI64,
}

impl FakeTransport {
    /// Create an empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery to `id` fail.
    pub async fn fail_for(&self, id: SubscriberId) {
        self.failing.lock().await.insert(id);
    }

    async fn check(&self, id: SubscriberId) -> Result<(), TransportError> {
        if self.failing.lock().await.contains(&id) {
            Err(TransportError::Delivery(format!("chat {id} unreachable")))
        } else {
            Ok(())
        }
    }

    /// Texts sent so far, in order.
    pub async fn texts(&self) -> Vec<(SubscriberId, String)> {
        self.outbox.lock().await.texts.clone()
    }

    /// Recipients of texts sent so far, in order.
    pub async fn text_recipients(&self) -> Vec<SubscriberId> {
        self.outbox
            .lock()
            .await
            .texts
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    /// Texts sent to `id`, in order.
    pub async fn texts_to(&self, id: SubscriberId) -> Vec<String> {
        self.outbox
            .lock()
            .await
            .texts
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Last text sent to `id`.
    pub async fn last_text_to(&self, id: SubscriberId) -> Option<String> {
        self.texts_to(id).await.pop()
    }

    /// Prompts sent so far, in order.
    pub async fn prompts(&self) -> Vec<SentPrompt> {
        self.outbox.lock().await.prompts.clone()
    }

    /// Last prompt sent.
    pub async fn last_prompt(&self) -> Option<SentPrompt> {
        self.outbox.lock().await.prompts.last().cloned()
    }

    /// Prompt edits so far, in order.
    pub async fn edits(&self) -> Vec<PromptEdit> {
        self.outbox.lock().await.edits.clone()
    }

    /// Last prompt edit.
    pub async fn last_edit(&self) -> Option<PromptEdit> {
        self.outbox.lock().await.edits.last().cloned()
    }

    /// Videos sent so far, in order.
    pub async fn videos(&self) -> Vec<(SubscriberId, PathBuf)> {
        self.outbox.lock().await.videos.clone()
    }

    /// Forget everything sent so far.
    pub async fn clear(&self) {
        *self.outbox.lock().await = Outbox::default();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_text(&self, to: SubscriberId, text: &str) -> Result<(), TransportError> {
        self.check(to).await?;
        self.outbox.lock().await.texts.push((to, text.to_string()));
        Ok(())
    }

    async fn send_prompt(
        &self,
        to: SubscriberId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<PromptId, TransportError> {
        self.check(to).await?;
        let prompt = PromptId::new(self.next_prompt.fetch_add(1, Ordering::SeqCst) + 1);
        self.outbox.lock().await.prompts.push(SentPrompt {
            to,
            prompt,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(prompt)
    }

    async fn edit_prompt(
        &self,
        to: SubscriberId,
        prompt: PromptId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        self.check(to).await?;
        self.outbox.lock().await.edits.push(PromptEdit {
            to,
            prompt,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn send_video(&self, to: SubscriberId, path: &Path) -> Result<(), TransportError> {
        self.check(to).await?;
        self.outbox
            .lock()
            .await
            .videos
            .push((to, path.to_path_buf()));
        Ok(())
    }
}

/// Camera that produces numbered fake artifacts.
#[derive(Debug, Default)]
pub struct FakeCamera {
    recording: AtomicBool,
    fail_start: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeCamera {
    /// Create an idle fake camera.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `start` calls fail.
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Successful starts so far.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Successful stops so far.
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Path of the `n`th artifact (1-based).
    #[must_use]
    pub fn artifact_path(n: usize) -> PathBuf {
        PathBuf::from(format!("/tmp/watchpost-fake/clip-{n}.mp4"))
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn start(&self) -> Result<(), CameraError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(CameraError::Io(std::io::Error::other("camera unplugged")));
        }
        if self.recording.swap(true, Ordering::SeqCst) {
            return Err(CameraError::AlreadyRecording);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<PathBuf, CameraError> {
        if !self.recording.swap(false, Ordering::SeqCst) {
            return Err(CameraError::NotRecording);
        }
        let n = self.stops.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Self::artifact_path(n))
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}
