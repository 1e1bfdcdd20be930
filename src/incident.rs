use crate::records::{Incident, MinuteOfDay, TimeWindow};
use serde::{Deserialize, Serialize};

/// How windows whose end is earlier than their start are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidnightPolicy {
    /// `start <= t <= end`, so a window running past midnight is never active
    #[default]
    Literal,
    /// A window with `end < start` is active when `t >= start || t <= end`
    Wrap,
}

impl MidnightPolicy {
    pub fn from_wrap_flag(wrap: bool) -> Self {
        if wrap {
            MidnightPolicy::Wrap
        } else {
            MidnightPolicy::Literal
        }
    }
}

impl TimeWindow {
    pub fn contains(&self, at: MinuteOfDay, policy: MidnightPolicy) -> bool {
        let t = u32::from(at.get());
        match policy {
            MidnightPolicy::Wrap if self.wraps_midnight() => t >= self.start || t <= self.end,
            _ => self.start <= t && t <= self.end,
        }
    }
}

impl Incident {
    pub fn is_active_at(&self, at: MinuteOfDay, policy: MidnightPolicy) -> bool {
        self.window.contains(at, policy)
    }
}

/// Indices of incidents active at `at`, in input order
pub fn active_incidents(incidents: &[Incident], at: MinuteOfDay, policy: MidnightPolicy) -> Vec<usize> {
    incidents
        .iter()
        .enumerate()
        .filter(|(_, incident)| incident.is_active_at(at, policy))
        .map(|(idx, _)| idx)
        .collect()
}
