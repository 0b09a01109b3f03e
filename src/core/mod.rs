mod cost_source;
mod engine;
mod schedule;
mod types;

pub use cost_source::{CostItem, CostSource};
pub use engine::{cost_per_output, present_value, real_rate, simulate, transport_tonnes_co2};
pub use schedule::{
    DAYS_PER_YEAR, TIME_EPSILON, build_timeline, days_to_years, schedule_new_part_events,
    schedule_reman_events,
};
pub use types::{
    Comparison, DisposalPolicy, Event, ParameterSet, SeriesPoint, SimulationResult,
    StaticComparisons, Strategy, Summary,
};
