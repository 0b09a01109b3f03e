use super::types::{Event, ParameterSet, Strategy};

/// Two instants closer than this (in years) are the same instant. Shared by the
/// scheduler, the timeline and the cost walk.
pub const TIME_EPSILON: f64 = 1e-6;

pub const DAYS_PER_YEAR: f64 = 365.0;

// Event times are snapped to 10 decimal places before they are compared.
const EVENT_TIME_SCALE: f64 = 1e10;

pub fn days_to_years(days: f64) -> f64 {
    days / DAYS_PER_YEAR
}

pub fn round_event_time(time: f64) -> f64 {
    (time * EVENT_TIME_SCALE).round() / EVENT_TIME_SCALE
}

pub fn schedule_new_part_events(params: &ParameterSet) -> Vec<Event> {
    let period =
        days_to_years(params.service_life_new_days) + days_to_years(params.lead_time_new_days);
    recurring_events(Strategy::NewPart, period, period, params.horizon_years)
}

/// The first remanufacture happens once the original new part has worn out and
/// the reman lead time has elapsed; later cycles recur on the reman period.
pub fn schedule_reman_events(params: &ParameterSet) -> Vec<Event> {
    let lead = days_to_years(params.lead_time_reman_days);
    let first = days_to_years(params.service_life_new_days) + lead;
    let period = days_to_years(params.service_life_reman_days) + lead;
    recurring_events(Strategy::Reman, first, period, params.horizon_years)
}

/// A period no longer than `TIME_EPSILON` would put several events on one timeline
/// instant, so it schedules nothing.
fn recurring_events(strategy: Strategy, first: f64, period: f64, horizon: f64) -> Vec<Event> {
    let mut events = Vec::new();
    if !period.is_finite()
        || period <= TIME_EPSILON
        || !first.is_finite()
        || !horizon.is_finite()
    {
        return events;
    }

    let mut cycle = 1_usize;
    loop {
        let time = first + (cycle - 1) as f64 * period;
        if time > horizon + TIME_EPSILON {
            break;
        }
        events.push(Event {
            strategy,
            cycle,
            time: round_event_time(time),
        });
        cycle += 1;
    }
    events
}

/// Merges every instant at which a rate, a window or a cash flow changes into one
/// sorted timeline. Candidates past the horizon are dropped.
pub fn build_timeline(
    horizon: f64,
    new_part_events: &[Event],
    reman_events: &[Event],
    service_life_new_years: f64,
    service_life_reman_years: f64,
) -> Vec<f64> {
    let horizon = horizon.max(0.0);
    let whole_years = horizon.floor() as u32;

    let mut candidates = Vec::with_capacity(
        whole_years as usize + new_part_events.len() + 2 * reman_events.len() + 3,
    );
    candidates.push(0.0);
    candidates.extend((1..=whole_years).map(f64::from));
    candidates.push(horizon);
    candidates.extend(reman_events.iter().map(|e| e.time));
    candidates.extend(new_part_events.iter().map(|e| e.time));
    candidates.push(service_life_new_years);
    candidates.extend(
        reman_events
            .iter()
            .map(|e| round_event_time(e.time + service_life_reman_years)),
    );

    candidates.retain(|t| t.is_finite() && *t >= 0.0 && *t <= horizon + TIME_EPSILON);
    candidates.sort_by(f64::total_cmp);
    candidates.dedup_by(|later, kept| (*later - *kept).abs() <= TIME_EPSILON);
    candidates
}
