use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(40);

/// Visible prefix of a reply being revealed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealFrame {
    pub shown: String,
    pub done: bool,
}

/// Word-by-word reveal of a complete reply.
///
/// A background task publishes growing prefixes on a watch channel, one word
/// per interval. Dropping or cancelling the handle stops it.
pub struct Reveal {
    text: Arc<str>,
    frames: watch::Receiver<RevealFrame>,
    task: JoinHandle<()>,
}

impl Reveal {
    /// Must be called from within a tokio runtime
    pub fn start(text: impl Into<Arc<str>>, interval: Duration) -> Self {
        let text: Arc<str> = text.into();
        let (tx, frames) = watch::channel(RevealFrame {
            shown: String::new(),
            done: false,
        });
        
        let source = text.clone();
        let task = tokio::spawn(async move {
            let words: Vec<&str> = source.split(' ').collect();
            let mut shown = String::with_capacity(source.len());
            
            for (i, word) in words.iter().enumerate() {
                tokio::time::sleep(interval).await;
                if i > 0 {
                    shown.push(' ');
                }
                shown.push_str(word);
                
                let frame = RevealFrame {
                    shown: shown.clone(),
                    done: i + 1 == words.len(),
                };
                if tx.send(frame).is_err() {
                    return;
                }
            }
        });
        
        Self { text, frames, task }
    }
    
    pub fn text(&self) -> &str {
        &self.text
    }
    
    pub fn current(&self) -> RevealFrame {
        self.frames.borrow().clone()
    }
    
    pub fn subscribe(&self) -> watch::Receiver<RevealFrame> {
        self.frames.clone()
    }
    
    pub fn cancel(&self) {
        self.task.abort();
    }
    
    /// True once the full text is shown or the reveal was cancelled
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
    
    /// Wait for the last frame; after a cancel this is the last prefix published
    pub async fn finished(&self) -> RevealFrame {
        let mut frames = self.frames.clone();
        let finished = frames.wait_for(|frame| frame.done).await.map(|frame| frame.clone());
        finished.unwrap_or_else(|_| frames.borrow().clone())
    }
}

impl Drop for Reveal {
    fn drop(&mut self) {
        self.task.abort();
    }
}
