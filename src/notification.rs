//! Transient status message shown above the carousel

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Active {
    text: String,
    expires_at: Option<Instant>,
}

/// The message line: a notification while one is active, the welcome text otherwise
#[derive(Debug, Clone)]
pub struct Notifier {
    welcome: String,
    default_duration: Duration,
    active: Option<Active>,
}

impl Notifier {
    pub fn new(welcome: impl Into<String>, default_duration: Duration) -> Self {
        Self {
            welcome: welcome.into(),
            default_duration,
            active: None,
        }
    }

    /// Show a message that reverts after the default duration
    pub fn notify(&mut self, text: impl Into<String>, now: Instant) {
        self.show(text, self.default_duration, now);
    }

    pub fn show(&mut self, text: impl Into<String>, duration: Duration, now: Instant) {
        let text = text.into();
        log::info!("Notification: {}", text.replace('\n', " "));
        self.active = Some(Active {
            text,
            expires_at: Some(now + duration),
        });
    }

    /// Show a message until replaced
    pub fn show_persistent(&mut self, text: impl Into<String>) {
        self.active = Some(Active {
            text: text.into(),
            expires_at: None,
        });
    }

    /// Drop back to the welcome text
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Text to display at `now`
    pub fn current(&self, now: Instant) -> &str {
        match &self.active {
            Some(active) if active.expires_at.map_or(true, |at| now < at) => &active.text,
            _ => &self.welcome,
        }
    }

    /// When the display next changes on its own, if ever
    pub fn next_change(&self, now: Instant) -> Option<Instant> {
        self.active
            .as_ref()
            .and_then(|a| a.expires_at)
            .filter(|&at| at > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELCOME: &str = "Welcome!\n\nSelect a game:\n";

    #[test]
    fn shows_welcome_by_default() {
        let notifier = Notifier::new(WELCOME, Duration::from_secs(3));
        assert_eq!(notifier.current(Instant::now()), WELCOME);
        assert_eq!(notifier.next_change(Instant::now()), None);
    }

    #[test]
    fn notification_reverts_after_duration() {
        let start = Instant::now();
        let mut notifier = Notifier::new(WELCOME, Duration::from_secs(3));
        notifier.notify("Game closed", start);

        assert_eq!(notifier.current(start), "Game closed");
        assert_eq!(notifier.current(start + Duration::from_millis(2999)), "Game closed");
        assert_eq!(notifier.current(start + Duration::from_secs(3)), WELCOME);
        assert_eq!(notifier.next_change(start), Some(start + Duration::from_secs(3)));
        assert_eq!(notifier.next_change(start + Duration::from_secs(4)), None);
    }

    #[test]
    fn persistent_message_never_expires() {
        let start = Instant::now();
        let mut notifier = Notifier::new(WELCOME, Duration::from_secs(3));
        notifier.show("Copying", Duration::from_secs(1), start);
        notifier.show_persistent("Copying games from the USB drive...");

        let later = start + Duration::from_secs(3600);
        assert_eq!(notifier.current(later), "Copying games from the USB drive...");
        assert_eq!(notifier.next_change(later), None);

        notifier.clear();
        assert_eq!(notifier.current(later), WELCOME);
    }
}
