use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    NewPart,
    Reman,
}

/// Where disposal cost/credit of the remanufactured unit is booked.
///
/// `HorizonEnd` books it once when the analysis ends. `EveryCycle` additionally
/// books it at every remanufacture, the way earlier revisions of the model did.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisposalPolicy {
    #[default]
    HorizonEnd,
    EveryCycle,
}

/// Effective scalar inputs for one engine run.
///
/// Percentages and day counts are stored as entered; the engine converts them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    pub acquisition_cost: f64,
    pub commissioning_cost: f64,
    pub disposal_new: f64,
    pub co2_unit_cost_new: f64,
    pub service_life_new_days: f64,
    pub lead_time_new_days: f64,
    pub discount_rate_new_pct: f64,
    pub distance_new_km: f64,
    pub output_rate_new: f64,

    pub reman_cost: f64,
    pub disposal_reman: f64,
    pub co2_unit_cost_reman: f64,
    pub reman_escalation_pct: f64,
    pub service_life_reman_days: f64,
    pub lead_time_reman_days: f64,
    pub discount_rate_reman_pct: f64,
    pub distance_reman_km: f64,
    pub output_rate_reman: f64,

    pub operating_cost_per_year: f64,
    pub horizon_years: f64,
    pub operating_hours_per_year: f64,
    pub quality_yield_pct: f64,
    pub performance_yield_pct: f64,
    pub inflation_pct: f64,
    pub co2_escalation_pct: f64,

    pub disposal_policy: DisposalPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub strategy: Strategy,
    pub cycle: usize,
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub time: f64,
    pub tco_reman: f64,
    pub tco_new: f64,
    pub output_reman: f64,
    pub output_new: f64,
    pub cost_per_output_reman: f64,
    pub cost_per_output_new: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub final_tco_reman: f64,
    pub final_tco_new: f64,
    pub savings: f64,
    pub savings_percent: f64,
    pub final_output_reman: f64,
    pub final_output_new: f64,
    pub final_cost_per_output_reman: f64,
    pub final_cost_per_output_new: f64,
    pub cost_per_output_delta: f64,
    pub cost_per_output_delta_percent: f64,
}

/// Undiscounted side-by-side value; `delta` is always reman minus new part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub new_part: f64,
    pub reman: f64,
    pub delta: f64,
}

impl Comparison {
    pub fn new(new_part: f64, reman: f64) -> Self {
        Self {
            new_part,
            reman,
            delta: reman - new_part,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticComparisons {
    pub lead_time_days: Comparison,
    pub co2_unit_cost: Comparison,
    pub disposal: Comparison,
    pub static_total: Comparison,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub real_rate_new: f64,
    pub real_rate_reman: f64,
    pub new_part_events: Vec<Event>,
    pub reman_events: Vec<Event>,
    pub series: Vec<SeriesPoint>,
    pub summary: Summary,
    pub comparisons: StaticComparisons,
}
