//! Canonical column names and scenario definitions.
//!
//! Every table produced by the loader carries exactly these columns, in this
//! order, so tables from different files can be stacked.

pub const ALG: &str = "alg";
pub const NUM_DEVICES: &str = "NumDevices";
pub const MOBILITY_SPEED: &str = "MobilitySpeed";
pub const TRAFFIC_INTERVAL: &str = "TrafficInterval";
pub const SIGMA: &str = "Sigma";
pub const MAX_RANDOM_LOSS: &str = "MaxRandomLoss";
pub const RUN_NUMBER: &str = "RunNumber";
pub const TOTAL_PACKETS: &str = "TotalPackets";
pub const SUCCESSFUL_PACKETS: &str = "SuccessfulPackets";
pub const PDR: &str = "PDR_Percent";
pub const ENERGY: &str = "AvgEnergy_mJ";
/// Derived: `PDR_Percent / AvgEnergy_mJ`.
pub const EFFICIENCY: &str = "Efficiency";

/// Numeric columns read from the summaries, in canonical order.
pub const NUMERIC_COLUMNS: [&str; 10] = [
    NUM_DEVICES,
    MOBILITY_SPEED,
    TRAFFIC_INTERVAL,
    SIGMA,
    MAX_RANDOM_LOSS,
    RUN_NUMBER,
    TOTAL_PACKETS,
    SUCCESSFUL_PACKETS,
    PDR,
    ENERGY,
];

/// Simulation parameters, in the order used to pick heatmap axes.
pub const PARAMETERS: [&str; 4] = [MOBILITY_SPEED, NUM_DEVICES, TRAFFIC_INTERVAL, SIGMA];

/// Columns that may carry the algorithm label when `alg` is missing.
pub const ALG_CANDIDATES: [&str; 5] = ["Algorithm", "algorithm", "Algorithme", "algorithme", "ADR"];

pub const UNKNOWN_ALG: &str = "Unknown";

/// The four algorithm variants compared by the study.
pub const ALGORITHMS: [&str; 4] = ["ADR-AVG", "ADR-Lite", "ADR-MAX", "No-ADR"];

/// A simulation campaign, named after its folder under `summaries/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scenario {
    Mobility,
    Density,
    TrafficInterval,
    Sigma,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Mobility,
        Scenario::Density,
        Scenario::TrafficInterval,
        Scenario::Sigma,
    ];

    /// Folder and file-name token used by the simulator.
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Mobility => "mobilite",
            Scenario::Density => "density",
            Scenario::TrafficInterval => "intervalle_d_envoie",
            Scenario::Sigma => "sigma",
        }
    }

    /// The parameter swept by this scenario.
    pub fn parameter(&self) -> &'static str {
        match self {
            Scenario::Mobility => MOBILITY_SPEED,
            Scenario::Density => NUM_DEVICES,
            Scenario::TrafficInterval => TRAFFIC_INTERVAL,
            Scenario::Sigma => SIGMA,
        }
    }

    /// Conventional summary file name for the first run.
    pub fn default_file(&self) -> String {
        format!("summary_{}_run1.csv", self.name())
    }

    /// Human-readable label, e.g. `Intervalle D Envoie`.
    pub fn title(&self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Format a parameter value the way it appears in file names and titles:
/// integers without a decimal point, everything else as written.
pub fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
