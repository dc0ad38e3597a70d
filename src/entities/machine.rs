//! Per-machine status board entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a machine is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum MachineState {
    #[default]
    InInjection,
    Breakdown,
    Setup,
    Stopped,
}

impl MachineState {
    /// Human label for boards and reports.
    pub fn label(&self) -> &'static str {
        match self {
            MachineState::InInjection => "In Injection",
            MachineState::Breakdown => "Breakdown",
            MachineState::Setup => "Setup",
            MachineState::Stopped => "Stopped",
        }
    }
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineState::InInjection => write!(f, "in_injection"),
            MachineState::Breakdown => write!(f, "breakdown"),
            MachineState::Setup => write!(f, "setup"),
            MachineState::Stopped => write!(f, "stopped"),
        }
    }
}

impl std::str::FromStr for MachineState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_injection" | "injection" | "in injection" | "running" => {
                Ok(MachineState::InInjection)
            }
            "breakdown" | "break" => Ok(MachineState::Breakdown),
            "setup" => Ok(MachineState::Setup),
            "stopped" | "stop" => Ok(MachineState::Stopped),
            _ => Err(format!(
                "Invalid machine status: {}. Use in_injection, breakdown, setup, or stopped",
                s
            )),
        }
    }
}

/// Current state of one physical machine, keyed by machine name. Upserted
/// in place; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineStatus {
    pub machine: String,
    pub product: String,
    pub operator: String,
    pub status: MachineState,
    pub updated_at: DateTime<Utc>,
}
