//! UPS status polling via `upsc`.
//!
//! Each cycle the `ups.status` variable is read and classified. Counts of
//! each state are kept for the life of the process and summarised on the
//! status line.

use crossterm::style::{Color, Stylize};

use crate::command::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsState {
    Online,
    Charging,
    OnBattery,
    /// Unknown status or the query failed.
    Fault,
}

impl UpsState {
    /// Classify a raw `ups.status` value (`None` when it could not be read).
    pub fn classify(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return UpsState::Fault;
        };
        let flags: Vec<&str> = status.split_whitespace().collect();
        match flags.as_slice() {
            ["OL"] => UpsState::Online,
            ["OL", "CHRG"] => UpsState::Charging,
            _ if flags.contains(&"OB") => UpsState::OnBattery,
            _ => UpsState::Fault,
        }
    }

    fn color(self) -> Color {
        match self {
            UpsState::Online => Color::Green,
            UpsState::Charging => Color::Blue,
            UpsState::OnBattery | UpsState::Fault => Color::Red,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsCounters {
    pub measured: u64,
    pub charging: u64,
    pub on_battery: u64,
    pub fault: u64,
}

impl UpsCounters {
    pub fn record(&mut self, state: UpsState) {
        self.measured += 1;
        match state {
            UpsState::Online => {}
            UpsState::Charging => self.charging += 1,
            UpsState::OnBattery => self.on_battery += 1,
            UpsState::Fault => self.fault += 1,
        }
    }

    /// Percentage of measured cycles spent charging.
    pub fn charge_percent(&self) -> f64 {
        if self.measured == 0 {
            0.0
        } else {
            100.0 * self.charging as f64 / self.measured as f64
        }
    }
}

/// Render the status line for one observation.
pub fn render_status_line(status: &str, state: UpsState, counters: &UpsCounters) -> String {
    let mut line = format!("UPS Status: {}  ", status.with(state.color()));

    if state == UpsState::Charging {
        line.push_str(&format!("Chrg {:.1}%  ", counters.charge_percent()));
    }

    let mut show_total = false;
    if counters.on_battery > 0 {
        line.push_str(&format!("Off {}  ", counters.on_battery.to_string().red()));
        show_total = true;
    }
    if counters.fault > 0 {
        line.push_str(&format!("Flt {}  ", counters.fault.to_string().red()));
        show_total = true;
    }
    if show_total {
        line.push_str(&format!("Ttl {}  ", counters.measured));
    }

    line
}

#[derive(Debug, Clone)]
pub struct UpsMonitor {
    ups_name: String,
    counters: UpsCounters,
}

impl UpsMonitor {
    pub fn new(ups_name: &str) -> Self {
        Self {
            ups_name: ups_name.to_string(),
            counters: UpsCounters::default(),
        }
    }

    pub fn counters(&self) -> &UpsCounters {
        &self.counters
    }

    /// Fold one observation into the counters and return the status line.
    pub fn observe(&mut self, status: Option<&str>) -> String {
        let state = UpsState::classify(status);
        self.counters.record(state);
        render_status_line(status.unwrap_or("Read Error"), state, &self.counters)
    }

    /// Query the UPS and return the rendered status line.
    pub async fn poll<R: CommandRunner>(&mut self, runner: &R) -> String {
        let status = self.query_status(runner).await;
        self.observe(status.as_deref())
    }

    async fn query_status<R: CommandRunner>(&self, runner: &R) -> Option<String> {
        let args = vec![self.ups_name.clone(), "ups.status".to_string()];
        match runner.run("upsc", &args, "UPS State: ups.status").await {
            Ok(out) => out
                .stdout
                .trim()
                .split(": ")
                .next()
                .map(str::to_string)
                .filter(|s| !s.is_empty()),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_statuses() {
        assert_eq!(UpsState::classify(Some("OL")), UpsState::Online);
        assert_eq!(UpsState::classify(Some("OL CHRG")), UpsState::Charging);
        assert_eq!(UpsState::classify(Some("OB DISCHRG")), UpsState::OnBattery);
        assert_eq!(UpsState::classify(Some("OB LB")), UpsState::OnBattery);
        assert_eq!(UpsState::classify(Some("BYPASS")), UpsState::Fault);
        assert_eq!(UpsState::classify(None), UpsState::Fault);
    }

    #[test]
    fn counters_track_each_state() {
        let mut monitor = UpsMonitor::new("myups@localhost");
        monitor.observe(Some("OL"));
        monitor.observe(Some("OL CHRG"));
        monitor.observe(Some("OB DISCHRG"));
        monitor.observe(None);

        let counters = monitor.counters();
        assert_eq!(counters.measured, 4);
        assert_eq!(counters.charging, 1);
        assert_eq!(counters.on_battery, 1);
        assert_eq!(counters.fault, 1);
        assert_eq!(counters.charge_percent(), 25.0);
    }

    #[test]
    fn totals_only_shown_after_problems() {
        let mut monitor = UpsMonitor::new("myups@localhost");
        let line = monitor.observe(Some("OL"));
        assert!(line.contains("OL"));
        assert!(!line.contains("Ttl"));

        let line = monitor.observe(Some("OB"));
        assert!(line.contains("Off"));
        assert!(line.contains("Ttl 2"));
    }

    #[test]
    fn read_error_is_reported_as_fault() {
        let mut monitor = UpsMonitor::new("myups@localhost");
        let line = monitor.observe(None);
        assert!(line.contains("Read Error"));
        assert!(line.contains("Flt"));
    }
}
