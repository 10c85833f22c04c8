use std::time::Instant;
use tracing::{debug, info};

/// Logs how long a user action took when dropped.
pub struct Timer {
    action: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(action: &'static str) -> Self {
        debug!("{}: started", action);
        Self {
            action,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("{} finished in {:.2?}", self.action, self.start.elapsed());
    }
}

/// Group digits in thousands: 164000 → "164,000".
pub fn fmt_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
