use tokio::sync::broadcast;

pub trait Shutdown {
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

/// Broadcasts a single shutdown notification to every subscriber.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    pub fn trigger(&self) {
        if self.sender.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no active subscribers");
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown for ShutdownSignal {
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}
