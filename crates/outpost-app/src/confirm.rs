use std::sync::Mutex;

use async_trait::async_trait;

/// Asks the operator whether a destructive mutation may go ahead.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way and remembers what it was asked.
#[derive(Debug)]
pub struct StaticConfirm {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl StaticConfirm {
    pub fn accept() -> Self {
        Self::new(true)
    }

    pub fn decline() -> Self {
        Self::new(false)
    }

    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.asked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ConfirmPrompt for StaticConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.asked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_owned());
        self.answer
    }
}
