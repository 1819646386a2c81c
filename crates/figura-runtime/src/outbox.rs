//! Outgoing protocol collaborator
//!
//! All sends are fire-and-forget; retries belong to the transport.

use std::sync::Arc;

use figura_core::{EffectId, Gender, ObjectId, OutgoingMessage};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// Outgoing protocol emitters
pub trait Outbox: Send {
    fn send_effect_selected(&mut self, effect: EffectId);

    fn send_figure_update(&mut self, gender: Gender, figure: &str);

    fn send_restricted_figure_update(&mut self, target: ObjectId, gender: Gender, figure: &str);

    fn send_wardrobe_request(&mut self);
}

/// Forwards messages to an async transport task
#[derive(Debug, Clone)]
pub struct ChannelOutbox {
    tx: mpsc::UnboundedSender<OutgoingMessage>,
}

impl ChannelOutbox {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutgoingMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelOutbox { tx }, rx)
    }

    fn send(&self, message: OutgoingMessage) {
        if let Err(e) = self.tx.send(message) {
            warn!("outgoing message dropped, transport gone: {:?}", e.0);
        }
    }
}

impl Outbox for ChannelOutbox {
    fn send_effect_selected(&mut self, effect: EffectId) {
        self.send(OutgoingMessage::EffectSelected(effect));
    }

    fn send_figure_update(&mut self, gender: Gender, figure: &str) {
        self.send(OutgoingMessage::FigureUpdate {
            gender,
            figure: figure.to_string(),
        });
    }

    fn send_restricted_figure_update(&mut self, target: ObjectId, gender: Gender, figure: &str) {
        self.send(OutgoingMessage::RestrictedFigureUpdate {
            target,
            gender,
            figure: figure.to_string(),
        });
    }

    fn send_wardrobe_request(&mut self) {
        self.send(OutgoingMessage::WardrobeRequest);
    }
}

/// Keeps every message; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingOutbox {
    sent: Arc<Mutex<Vec<OutgoingMessage>>>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        RecordingOutbox::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Outbox for RecordingOutbox {
    fn send_effect_selected(&mut self, effect: EffectId) {
        self.sent.lock().push(OutgoingMessage::EffectSelected(effect));
    }

    fn send_figure_update(&mut self, gender: Gender, figure: &str) {
        self.sent.lock().push(OutgoingMessage::FigureUpdate {
            gender,
            figure: figure.to_string(),
        });
    }

    fn send_restricted_figure_update(&mut self, target: ObjectId, gender: Gender, figure: &str) {
        self.sent.lock().push(OutgoingMessage::RestrictedFigureUpdate {
            target,
            gender,
            figure: figure.to_string(),
        });
    }

    fn send_wardrobe_request(&mut self) {
        self.sent.lock().push(OutgoingMessage::WardrobeRequest);
    }
}
