use super::schedule::{
    TIME_EPSILON, build_timeline, days_to_years, schedule_new_part_events, schedule_reman_events,
};
use super::types::{
    Comparison, DisposalPolicy, Event, ParameterSet, SeriesPoint, SimulationResult,
    StaticComparisons, Summary,
};

// Round trip of one transport, in grams of CO2 per km.
const TRANSPORT_CO2_GRAMS_PER_KM: f64 = 490.0;
const GRAMS_PER_TONNE: f64 = 1_000_000.0;
const CENTS_PER_UNIT: f64 = 100.0;

/// Quantities derived once per run from the raw parameters.
#[derive(Debug, Clone, Copy)]
struct RunConstants {
    rate_new: f64,
    rate_reman: f64,
    service_life_new_years: f64,
    service_life_reman_years: f64,
    co2_tonnes_new: f64,
    co2_tonnes_reman: f64,
    first_reman: f64,
    yield_hours: f64,
}

impl RunConstants {
    fn new(params: &ParameterSet, reman_events: &[Event]) -> Self {
        Self {
            rate_new: real_rate(params.discount_rate_new_pct, params.inflation_pct),
            rate_reman: real_rate(params.discount_rate_reman_pct, params.inflation_pct),
            service_life_new_years: days_to_years(params.service_life_new_days),
            service_life_reman_years: days_to_years(params.service_life_reman_days),
            co2_tonnes_new: transport_tonnes_co2(params.distance_new_km),
            co2_tonnes_reman: transport_tonnes_co2(params.distance_reman_km),
            first_reman: reman_events.first().map_or(f64::INFINITY, |e| e.time),
            yield_hours: params.operating_hours_per_year
                * (params.quality_yield_pct / 100.0)
                * (params.performance_yield_pct / 100.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RunningState {
    tco_reman: f64,
    tco_new: f64,
    output_reman: f64,
    output_new: f64,
}

impl RunningState {
    fn point(self, time: f64) -> SeriesPoint {
        SeriesPoint {
            time,
            tco_reman: self.tco_reman,
            tco_new: self.tco_new,
            output_reman: self.output_reman,
            output_new: self.output_new,
            cost_per_output_reman: cost_per_output(self.tco_reman, self.output_reman),
            cost_per_output_new: cost_per_output(self.tco_new, self.output_new),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProductionWindow {
    start: f64,
    end: f64,
    rate: f64,
}

pub fn simulate(params: &ParameterSet) -> SimulationResult {
    let new_part_events = schedule_new_part_events(params);
    let reman_events = schedule_reman_events(params);
    let constants = RunConstants::new(params, &reman_events);
    let timeline = build_timeline(
        params.horizon_years,
        &new_part_events,
        &reman_events,
        constants.service_life_new_years,
        constants.service_life_reman_years,
    );

    let initial_investment = params.acquisition_cost + params.commissioning_cost;
    let mut state = RunningState {
        tco_reman: initial_investment,
        tco_new: initial_investment,
        output_reman: 0.0,
        output_new: 0.0,
    };
    let mut series = Vec::with_capacity(timeline.len());

    let mut t0 = 0.0;
    for &t1 in &timeline {
        apply_operating_charge(params, &constants, t1, &mut state);
        if let Some(event) = event_at(&reman_events, t1) {
            apply_reman_event(params, &constants, event, &mut state);
        }
        if let Some(event) = event_at(&new_part_events, t1) {
            apply_new_part_event(params, &constants, event, &mut state);
        }
        accumulate_output(
            params,
            &constants,
            &new_part_events,
            &reman_events,
            t0,
            t1,
            &mut state,
        );

        series.push(state.point(t1));
        t0 = t1;
    }

    apply_end_of_horizon_disposal(params, &constants, &mut series);

    SimulationResult {
        real_rate_new: constants.rate_new,
        real_rate_reman: constants.rate_reman,
        summary: compile_summary(&series),
        comparisons: static_comparisons(params),
        new_part_events,
        reman_events,
        series,
    }
}

/// Fisher relation. Negative results are valid.
pub fn real_rate(nominal_pct: f64, inflation_pct: f64) -> f64 {
    (1.0 + nominal_pct / 100.0) / (1.0 + inflation_pct / 100.0) - 1.0
}

pub fn present_value(amount: f64, rate: f64, time: f64) -> f64 {
    if time.abs() < TIME_EPSILON || rate.abs() < TIME_EPSILON {
        return amount;
    }
    amount / (1.0 + rate).powf(time)
}

pub fn transport_tonnes_co2(distance_km: f64) -> f64 {
    2.0 * distance_km * TRANSPORT_CO2_GRAMS_PER_KM / GRAMS_PER_TONNE
}

/// Expressed in cents per produced unit.
pub fn cost_per_output(tco: f64, output: f64) -> f64 {
    if output > 0.0 {
        tco / output * CENTS_PER_UNIT
    } else {
        0.0
    }
}

fn transport_co2_cost(tonnes: f64, unit_cost: f64, escalation_pct: f64, time: f64) -> f64 {
    tonnes * unit_cost * (1.0 + escalation_pct / 100.0).powf(time)
}

fn is_year_end(time: f64, horizon: f64) -> bool {
    (time - time.round()).abs() <= TIME_EPSILON
        && time >= 1.0 - TIME_EPSILON
        && time <= horizon + TIME_EPSILON
}

fn event_at(events: &[Event], time: f64) -> Option<&Event> {
    let idx = events.partition_point(|e| e.time < time - TIME_EPSILON);
    events
        .get(idx)
        .filter(|e| (e.time - time).abs() <= TIME_EPSILON)
}

fn apply_operating_charge(
    params: &ParameterSet,
    constants: &RunConstants,
    t1: f64,
    state: &mut RunningState,
) {
    if !is_year_end(t1, params.horizon_years) {
        return;
    }
    // Only the reman column switches regime, and only once.
    let reman_rate = if t1 < constants.first_reman - TIME_EPSILON {
        constants.rate_new
    } else {
        constants.rate_reman
    };
    state.tco_reman += present_value(params.operating_cost_per_year, reman_rate, t1);
    state.tco_new += present_value(params.operating_cost_per_year, constants.rate_new, t1);
}

fn apply_reman_event(
    params: &ParameterSet,
    constants: &RunConstants,
    event: &Event,
    state: &mut RunningState,
) {
    let t = event.time;
    let escalation = 1.0 + (event.cycle - 1) as f64 * params.reman_escalation_pct / 100.0;
    let co2 = transport_co2_cost(
        constants.co2_tonnes_reman,
        params.co2_unit_cost_reman,
        params.co2_escalation_pct,
        t,
    );
    state.tco_reman += present_value(
        params.reman_cost * escalation + co2,
        constants.rate_reman,
        t,
    );
    if params.disposal_policy == DisposalPolicy::EveryCycle {
        state.tco_reman += present_value(params.disposal_reman, constants.rate_reman, t);
    }
}

fn apply_new_part_event(
    params: &ParameterSet,
    constants: &RunConstants,
    event: &Event,
    state: &mut RunningState,
) {
    let t = event.time;
    let co2 = transport_co2_cost(
        constants.co2_tonnes_new,
        params.co2_unit_cost_new,
        params.co2_escalation_pct,
        t,
    );
    state.tco_new += present_value(params.disposal_new, constants.rate_new, t);
    state.tco_new += present_value(
        params.acquisition_cost + params.commissioning_cost + co2,
        constants.rate_new,
        t,
    );
}

/// The unit in service during `(t0, t1]` is the one installed by the last event
/// at or before `t0`; before any event it is the original new part.
fn active_window(
    events: &[Event],
    t0: f64,
    original: ProductionWindow,
    service_life_years: f64,
    rate: f64,
) -> ProductionWindow {
    let installed = events.partition_point(|e| e.time <= t0 + TIME_EPSILON);
    match events[..installed].last() {
        Some(event) => ProductionWindow {
            start: event.time,
            end: event.time + service_life_years,
            rate,
        },
        None => original,
    }
}

fn productive_time(t0: f64, t1: f64, window: ProductionWindow) -> f64 {
    (t1.min(window.end) - t0.max(window.start)).max(0.0)
}

fn accumulate_output(
    params: &ParameterSet,
    constants: &RunConstants,
    new_part_events: &[Event],
    reman_events: &[Event],
    t0: f64,
    t1: f64,
    state: &mut RunningState,
) {
    let original = ProductionWindow {
        start: 0.0,
        end: constants.service_life_new_years,
        rate: params.output_rate_new,
    };

    let reman_window = active_window(
        reman_events,
        t0,
        original,
        constants.service_life_reman_years,
        params.output_rate_reman,
    );
    let new_window = active_window(
        new_part_events,
        t0,
        original,
        constants.service_life_new_years,
        params.output_rate_new,
    );

    state.output_reman +=
        productive_time(t0, t1, reman_window) * constants.yield_hours * reman_window.rate;
    state.output_new +=
        productive_time(t0, t1, new_window) * constants.yield_hours * new_window.rate;
}

fn apply_end_of_horizon_disposal(
    params: &ParameterSet,
    constants: &RunConstants,
    series: &mut [SeriesPoint],
) {
    let horizon = params.horizon_years;
    if horizon <= TIME_EPSILON {
        return;
    }
    let Some(last) = series.last_mut() else {
        return;
    };
    if (last.time - horizon).abs() > TIME_EPSILON {
        return;
    }

    last.tco_reman += present_value(params.disposal_reman, constants.rate_reman, horizon);
    last.tco_new += present_value(params.disposal_new, constants.rate_new, horizon);
    last.cost_per_output_reman = cost_per_output(last.tco_reman, last.output_reman);
    last.cost_per_output_new = cost_per_output(last.tco_new, last.output_new);
}

fn compile_summary(series: &[SeriesPoint]) -> Summary {
    let last = series.last().copied().unwrap_or(SeriesPoint {
        time: 0.0,
        tco_reman: 0.0,
        tco_new: 0.0,
        output_reman: 0.0,
        output_new: 0.0,
        cost_per_output_reman: 0.0,
        cost_per_output_new: 0.0,
    });

    let savings = last.tco_new - last.tco_reman;
    let savings_percent = if last.tco_new == 0.0 {
        0.0
    } else {
        savings / last.tco_new * 100.0
    };
    let cost_per_output_delta = last.cost_per_output_reman - last.cost_per_output_new;
    let cost_per_output_delta_percent = if last.cost_per_output_new == 0.0 {
        0.0
    } else {
        cost_per_output_delta / last.cost_per_output_new * 100.0
    };

    Summary {
        final_tco_reman: last.tco_reman,
        final_tco_new: last.tco_new,
        savings,
        savings_percent,
        final_output_reman: last.output_reman,
        final_output_new: last.output_new,
        final_cost_per_output_reman: last.cost_per_output_reman,
        final_cost_per_output_new: last.cost_per_output_new,
        cost_per_output_delta,
        cost_per_output_delta_percent,
    }
}

/// Raw parameter sums for at-a-glance tiles. No discounting, no escalation.
fn static_comparisons(params: &ParameterSet) -> StaticComparisons {
    let static_new = params.acquisition_cost
        + params.commissioning_cost
        + params.operating_cost_per_year
        + params.disposal_new
        + params.co2_unit_cost_new;
    let static_reman = params.reman_cost + params.disposal_reman + params.co2_unit_cost_reman;

    StaticComparisons {
        lead_time_days: Comparison::new(params.lead_time_new_days, params.lead_time_reman_days),
        co2_unit_cost: Comparison::new(params.co2_unit_cost_new, params.co2_unit_cost_reman),
        disposal: Comparison::new(params.disposal_new, params.disposal_reman),
        static_total: Comparison::new(static_new, static_reman),
    }
}
