//! Client interaction and visibility signals.
//!
//! The activity monitor does not register listeners on any particular UI.
//! It subscribes to a [`SignalSource`]; the embedding application (or a
//! test) feeds signals into it, typically through a [`SignalHub`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of buffered signals per subscriber.
const DEFAULT_CAPACITY: usize = 64;

/// Kind of user interaction that counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Mouse or pen movement and clicks.
    Pointer,
    /// Key presses.
    Keyboard,
    /// Scrolling.
    Scroll,
    /// Touch gestures.
    Touch,
}

/// Whether the tracked view is currently shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// The view is in the foreground.
    Visible,
    /// The view is hidden (background tab, minimised window).
    Hidden,
}

/// A signal observed on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ClientSignal {
    /// The user interacted with the view.
    Input(InputKind),
    /// The view's visibility changed.
    Visibility(Visibility),
}

/// Something the activity monitor can subscribe to.
pub trait SignalSource: Send + Sync + std::fmt::Debug + 'static {
    /// Open a new subscription. Dropping the receiver detaches it.
    fn subscribe(&self) -> broadcast::Receiver<ClientSignal>;
}

/// Broadcast hub that fans signals out to every subscriber.
#[derive(Debug, Clone)]
pub struct SignalHub {
    sender: broadcast::Sender<ClientSignal>,
}

impl SignalHub {
    /// Create a hub with the default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a hub buffering up to `capacity` signals per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a signal. Returns how many subscribers received it.
    pub fn emit(&self, signal: ClientSignal) -> usize {
        self.sender.send(signal).unwrap_or(0)
    }

    /// Publish an interaction.
    pub fn input(&self, kind: InputKind) -> usize {
        self.emit(ClientSignal::Input(kind))
    }

    /// Publish a visibility change.
    pub fn visibility(&self, visibility: Visibility) -> usize {
        self.emit(ClientSignal::Visibility(visibility))
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for SignalHub {
    fn subscribe(&self) -> broadcast::Receiver<ClientSignal> {
        self.sender.subscribe()
    }
}
