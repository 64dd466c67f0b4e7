//! Scripted mock adapter for tests.
//!
//! Records every command issued by the driver and answers queries from a
//! queue of canned replies, so tests can assert exact wire traffic without
//! hardware. Clones share state, which lets a test keep a handle on the
//! traffic log after handing the boxed adapter to the driver.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ScpiAdapter;

#[derive(Default)]
struct MockState {
    responses: VecDeque<String>,
    commands: Vec<String>,
}

/// Test double for the SCPI link.
#[derive(Clone, Default)]
pub struct MockAdapter {
    connected: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
}

impl MockAdapter {
    /// Create a disconnected mock with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next unanswered query.
    pub async fn push_response(&self, response: &str) {
        self.state
            .lock()
            .await
            .responses
            .push_back(response.to_string());
    }

    /// All commands issued so far, queries included, in order.
    pub async fn commands(&self) -> Vec<String> {
        self.state.lock().await.commands.clone()
    }

    /// Drop the recorded traffic, keeping the connection state.
    pub async fn clear_commands(&self) {
        self.state.lock().await.commands.clear();
    }
}

#[async_trait]
impl ScpiAdapter for MockAdapter {
    async fn connect(&mut self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        if !self.is_connected() {
            return Err(anyhow!("mock adapter not connected"));
        }
        let mut state = self.state.lock().await;
        state.commands.push(command.to_string());
        state
            .responses
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted response for query '{}'", command))
    }

    async fn send(&mut self, command: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(anyhow!("mock adapter not connected"));
        }
        self.state.lock().await.commands.push(command.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn info(&self) -> String {
        "MockAdapter".to_string()
    }
}
