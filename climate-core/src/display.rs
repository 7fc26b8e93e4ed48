use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::render::escape;

/// What a display region currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub visible: bool,
    pub html: String,
}

/// Shared handle to one display region.
///
/// `content` is locked only for a single read or write. `turn` orders
/// exclusive writers and is held for as long as such a writer lives.
#[derive(Debug, Clone, Default)]
pub struct DisplaySlot {
    content: Arc<Mutex<SlotSnapshot>>,
    turn: Arc<Mutex<()>>,
}

impl DisplaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> SlotSnapshot {
        self.content.lock().await.clone()
    }

    /// Writer that takes no turn; concurrent writers interleave freely.
    pub fn shared_writer(&self) -> SlotWriter {
        SlotWriter {
            slot: self.clone(),
            _turn: None,
        }
    }

    /// Writer that owns the slot's turn until it is dropped. Waits for any
    /// earlier holder to finish first. Readers are never blocked.
    pub async fn exclusive_writer(&self) -> SlotWriter {
        let turn = self.turn.clone().lock_owned().await;
        SlotWriter {
            slot: self.clone(),
            _turn: Some(turn),
        }
    }
}

pub struct SlotWriter {
    slot: DisplaySlot,
    _turn: Option<OwnedMutexGuard<()>>,
}

impl SlotWriter {
    /// Show plain text; it is escaped before it reaches the region.
    pub async fn show_text(&mut self, text: &str) {
        self.show_html(escape(text)).await;
    }

    pub async fn show_html(&mut self, html: String) {
        let mut content = self.slot.content.lock().await;
        content.visible = true;
        content.html = html;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn new_slot_is_hidden_and_empty() {
        let slot = DisplaySlot::new();
        assert_eq!(slot.snapshot().await, SlotSnapshot::default());
    }

    #[tokio::test]
    async fn writing_makes_slot_visible() {
        let slot = DisplaySlot::new();
        let mut writer = slot.shared_writer();
        writer.show_text("a < b").await;

        let snap = slot.snapshot().await;
        assert!(snap.visible);
        assert_eq!(snap.html, "a &lt; b");
    }

    #[tokio::test]
    async fn exclusive_writer_blocks_other_writers() {
        let slot = DisplaySlot::new();
        let mut first = slot.exclusive_writer().await;
        first.show_html("first".into()).await;

        let other = slot.clone();
        let second = tokio::spawn(async move {
            let mut w = other.exclusive_writer().await;
            w.show_html("second".into()).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        drop(first);
        second.await.unwrap();
        assert_eq!(slot.snapshot().await.html, "second");
    }

    #[tokio::test]
    async fn snapshot_is_readable_while_exclusive_writer_is_held() {
        let slot = DisplaySlot::new();
        let mut writer = slot.exclusive_writer().await;
        writer.show_text("Fetching...").await;

        let snap = tokio::time::timeout(Duration::from_millis(100), slot.snapshot())
            .await
            .expect("snapshot should not wait for the writer");
        assert_eq!(snap.html, "Fetching...");
        drop(writer);
    }
}
