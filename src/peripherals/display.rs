use log::info;

use crate::models::DisplayStatus;

/// Local status output. Write-only: the engine never reads it back.
pub trait StatusDisplay: Send {
    fn show(&mut self, status: &DisplayStatus);
}

/// Logs the status line whenever it changes
#[derive(Debug, Default)]
pub struct LogDisplay {
    last: Option<DisplayStatus>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

fn field(value: Option<f32>, unit: &str) -> String {
    value
        .map(|v| format!("{:.1}{}", v, unit))
        .unwrap_or_else(|| "--".to_string())
}

pub fn render(status: &DisplayStatus) -> String {
    format!(
        "T {} | RH {} | net {} | clock {} | buffered {}",
        field(status.temperature, "°C"),
        field(status.humidity, "%"),
        if status.connected { "up" } else { "down" },
        if status.clock_synced { "sync" } else { "free" },
        status.buffered
    )
}

impl StatusDisplay for LogDisplay {
    fn show(&mut self, status: &DisplayStatus) {
        if self.last.as_ref() == Some(status) {
            return;
        }
        info!("{}", render(status));
        self.last = Some(*status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_missing_values_as_dashes() {
        let status = DisplayStatus {
            temperature: None,
            humidity: Some(48.3),
            connected: false,
            clock_synced: true,
            buffered: 3,
        };
        assert_eq!(
            render(&status),
            "T -- | RH 48.3% | net down | clock sync | buffered 3"
        );
    }

    #[test]
    fn remembers_last_shown_status() {
        let mut display = LogDisplay::new();
        let status = DisplayStatus::default();
        display.show(&status);
        assert_eq!(display.last, Some(status));
    }
}
