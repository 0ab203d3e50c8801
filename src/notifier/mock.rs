//! Recording notifier for tests

use super::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

pub struct MockNotifier {
    messages: Mutex<Vec<String>>,
    call_count: AtomicUsize,
    configured: bool,
    should_fail: bool,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            configured: true,
            should_fail: false,
        }
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves like a notifier with no credentials
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Default::default()
        }
    }

    /// Every send returns an error
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Number of calls to `send`, including failed and no-op ones
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Messages that would have gone out over the wire
    pub async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.configured {
            return Ok(());
        }
        if self.should_fail {
            anyhow::bail!("Mock failure");
        }

        self.messages.lock().await.push(text.to_string());
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
