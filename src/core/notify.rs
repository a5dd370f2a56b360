//! Hand-off from the board to the display.
//!
//! Four independent unbounded channels, one per display element. Sending
//! never waits on the display, and each channel delivers in order.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone)]
pub struct NotificationBus {
    timer: UnboundedSender<String>,
    counter: UnboundedSender<String>,
    visibility: UnboundedSender<bool>,
    name: UnboundedSender<String>,
}

/// Display side of the bus.
#[derive(Debug)]
pub struct UiReceivers {
    /// Elapsed set time as `mm:ss`.
    pub timer: UnboundedReceiver<String>,
    /// Repetition count as text.
    pub counter: UnboundedReceiver<String>,
    /// Whether athlete data is available (shown as 0/1 by the display).
    pub visibility: UnboundedReceiver<bool>,
    pub name: UnboundedReceiver<String>,
}

pub fn notification_channels() -> (NotificationBus, UiReceivers) {
    let (timer_tx, timer_rx) = unbounded_channel();
    let (counter_tx, counter_rx) = unbounded_channel();
    let (visibility_tx, visibility_rx) = unbounded_channel();
    let (name_tx, name_rx) = unbounded_channel();

    (
        NotificationBus {
            timer: timer_tx,
            counter: counter_tx,
            visibility: visibility_tx,
            name: name_tx,
        },
        UiReceivers {
            timer: timer_rx,
            counter: counter_rx,
            visibility: visibility_rx,
            name: name_rx,
        },
    )
}

impl NotificationBus {
    pub fn timer_text(&self, text: String) {
        tracing::trace!("Timer: {}", text);
        if self.timer.send(text).is_err() {
            tracing::debug!("Display dropped the timer channel");
        }
    }

    pub fn counter(&self, count: u32) {
        tracing::debug!("🔢 Counter: {}", count);
        if self.counter.send(count.to_string()).is_err() {
            tracing::debug!("Display dropped the counter channel");
        }
    }

    pub fn visibility(&self, visible: bool) {
        tracing::debug!("Name visible: {}", u8::from(visible));
        if self.visibility.send(visible).is_err() {
            tracing::debug!("Display dropped the visibility channel");
        }
    }

    pub fn athlete_name(&self, name: &str) {
        tracing::info!("🏋️ Athlete: {}", name);
        if self.name.send(name.to_string()).is_err() {
            tracing::debug!("Display dropped the name channel");
        }
    }
}

impl UiReceivers {
    /// Everything currently queued on each channel, without waiting.
    pub fn drain(&mut self) -> DrainedNotifications {
        DrainedNotifications {
            timer: drain_channel(&mut self.timer),
            counter: drain_channel(&mut self.counter),
            visibility: drain_channel(&mut self.visibility),
            name: drain_channel(&mut self.name),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainedNotifications {
    pub timer: Vec<String>,
    pub counter: Vec<String>,
    pub visibility: Vec<bool>,
    pub name: Vec<String>,
}

fn drain_channel<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut values = Vec::new();
    while let Ok(value) = rx.try_recv() {
        values.push(value);
    }
    values
}
