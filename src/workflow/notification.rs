//! The single alert shown on the rosbag page.
//!
//! Alerts are versioned. Each action takes a [`Ticket`] when it starts and
//! publishes its outcome with that ticket later; an outcome only lands if no
//! action started after it has already published. Overlapping completions
//! therefore resolve in the order the actions were started, not the order
//! their responses arrive.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alert {
    pub open: bool,
    pub severity: Severity,
    pub title: String,
    pub message: Vec<String>,
}

impl Alert {
    pub fn new(severity: Severity, title: impl Into<String>, message: Vec<String>) -> Self {
        Self {
            open: true,
            severity,
            title: title.into(),
            message,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, vec![message.into()])
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, vec![message.into()])
    }

    pub fn error(title: impl Into<String>, message: Vec<String>) -> Self {
        Self::new(Severity::Error, title, message)
    }
}

/// Monotonic sequence number of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct NotificationSlot {
    issued: u64,
    shown: Ticket,
    alert: Alert,
}

impl NotificationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next sequence number.
    pub fn reserve(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Shows `alert` unless a later ticket already published.
    pub fn publish(&mut self, ticket: Ticket, alert: Alert) -> bool {
        if ticket <= self.shown {
            return false;
        }
        self.shown = ticket;
        self.alert = Alert { open: true, ..alert };
        true
    }

    pub fn raise(&mut self, alert: Alert) -> Ticket {
        let ticket = self.reserve();
        self.publish(ticket, alert);
        ticket
    }

    /// Closes the alert the user saw. A newer alert stays open.
    pub fn close(&mut self, seen: Ticket) -> bool {
        if seen != self.shown {
            return false;
        }
        self.alert = Alert::default();
        true
    }

    pub fn current(&self) -> &Alert {
        &self.alert
    }

    pub fn current_ticket(&self) -> Ticket {
        self.shown
    }
}
