mod error;
mod scenario;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::core::{
    CostItem, CostSource, DisposalPolicy, Event, ParameterSet, SeriesPoint, SimulationResult,
    StaticComparisons, Summary, simulate,
};

pub use error::{CliError, ParameterError, ScenarioError};
pub use scenario::{load_scenario, parse_scenario};

const BIN_NAME: &str = "reman-tco";
const MAX_HORIZON_YEARS: f64 = 100.0;
const HOURS_PER_YEAR: f64 = 8760.0;
const MIN_PERIOD_DAYS: f64 = 1.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliDisposalPolicy {
    HorizonEnd,
    EveryCycle,
}

impl From<CliDisposalPolicy> for DisposalPolicy {
    fn from(value: CliDisposalPolicy) -> Self {
        match value {
            CliDisposalPolicy::HorizonEnd => DisposalPolicy::HorizonEnd,
            CliDisposalPolicy::EveryCycle => DisposalPolicy::EveryCycle,
        }
    }
}

impl From<DisposalPolicy> for CliDisposalPolicy {
    fn from(value: DisposalPolicy) -> Self {
        match value {
            DisposalPolicy::HorizonEnd => CliDisposalPolicy::HorizonEnd,
            DisposalPolicy::EveryCycle => CliDisposalPolicy::EveryCycle,
        }
    }
}

/// Request body for `/api/simulate` and the shape of TOML scenario files.
/// Every field is optional; missing fields keep the reference scenario value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    acquisition_cost: Option<f64>,
    acquisition_cost_items: Option<Vec<CostItem>>,
    commissioning_cost: Option<f64>,
    commissioning_cost_items: Option<Vec<CostItem>>,
    disposal_new: Option<f64>,
    co2_unit_cost_new: Option<f64>,
    service_life_new_days: Option<f64>,
    lead_time_new_days: Option<f64>,
    discount_rate_new_pct: Option<f64>,
    distance_new_km: Option<f64>,
    output_rate_new: Option<f64>,

    reman_cost: Option<f64>,
    reman_cost_items: Option<Vec<CostItem>>,
    disposal_reman: Option<f64>,
    co2_unit_cost_reman: Option<f64>,
    reman_escalation_pct: Option<f64>,
    service_life_reman_days: Option<f64>,
    lead_time_reman_days: Option<f64>,
    discount_rate_reman_pct: Option<f64>,
    distance_reman_km: Option<f64>,
    output_rate_reman: Option<f64>,

    operating_cost_per_year: Option<f64>,
    operating_cost_items: Option<Vec<CostItem>>,
    horizon_years: Option<f64>,
    operating_hours_per_year: Option<f64>,
    quality_yield_pct: Option<f64>,
    performance_yield_pct: Option<f64>,
    inflation_pct: Option<f64>,
    co2_escalation_pct: Option<f64>,

    disposal_policy: Option<DisposalPolicy>,
    summary_only: Option<bool>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = BIN_NAME,
    about = "Discounted TCO of periodic new-part replacement vs. remanufacturing (REMAN)",
    after_help = "Run `reman-tco serve [port]` to start the JSON HTTP API instead."
)]
struct Cli {
    #[arg(long, default_value_t = 50_000.0, help = "Acquisition cost of one new part")]
    acquisition_cost: f64,
    #[arg(
        long = "acquisition-item",
        value_parser = parse_cost_item,
        help = "Acquisition cost line item as LABEL=AMOUNT; repeatable, overrides --acquisition-cost"
    )]
    acquisition_items: Vec<CostItem>,
    #[arg(long, default_value_t = 15_000.0, help = "Commissioning cost per installed new part")]
    commissioning_cost: f64,
    #[arg(
        long = "commissioning-item",
        value_parser = parse_cost_item,
        help = "Commissioning cost line item as LABEL=AMOUNT; repeatable"
    )]
    commissioning_items: Vec<CostItem>,
    #[arg(
        long,
        default_value_t = 2_000.0,
        help = "Disposal cost (positive) or scrap credit (negative) of a new part"
    )]
    disposal_new: f64,
    #[arg(long, default_value_t = 500.0, help = "CO2 price for new-part transport in EUR/t")]
    co2_unit_cost_new: f64,
    #[arg(long, default_value_t = 1460.0, help = "New-part service life in days")]
    service_life_new_days: f64,
    #[arg(long, default_value_t = 90.0, help = "New-part replacement lead time in days")]
    lead_time_new_days: f64,
    #[arg(long, default_value_t = 5.0, help = "Nominal discount rate for new parts in percent")]
    discount_rate_new_pct: f64,
    #[arg(long, default_value_t = 500.0, help = "One-way transport distance of a new part in km")]
    distance_new_km: f64,
    #[arg(long, default_value_t = 120.0, help = "New-part production rate in units per hour")]
    output_rate_new: f64,

    #[arg(long, default_value_t = 25_000.0, help = "Cost of one remanufacturing cycle")]
    reman_cost: f64,
    #[arg(
        long = "reman-item",
        value_parser = parse_cost_item,
        help = "Remanufacturing cost line item as LABEL=AMOUNT; repeatable"
    )]
    reman_items: Vec<CostItem>,
    #[arg(
        long,
        default_value_t = 1_000.0,
        help = "Disposal cost (positive) or scrap credit (negative) of a reman part"
    )]
    disposal_reman: f64,
    #[arg(long, default_value_t = 200.0, help = "CO2 price for reman transport in EUR/t")]
    co2_unit_cost_reman: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Linear reman cost increase per cycle in percent"
    )]
    reman_escalation_pct: f64,
    #[arg(long, default_value_t = 1095.0, help = "Reman service life in days")]
    service_life_reman_days: f64,
    #[arg(long, default_value_t = 45.0, help = "Remanufacturing lead time in days")]
    lead_time_reman_days: f64,
    #[arg(long, default_value_t = 4.5, help = "Nominal discount rate for reman in percent")]
    discount_rate_reman_pct: f64,
    #[arg(
        long,
        default_value_t = 150.0,
        help = "One-way transport distance to the remanufacturer in km"
    )]
    distance_reman_km: f64,
    #[arg(long, default_value_t = 115.0, help = "Reman production rate in units per hour")]
    output_rate_reman: f64,

    #[arg(
        long,
        default_value_t = 8_000.0,
        help = "Operating cost per year, charged to both strategies"
    )]
    operating_cost_per_year: f64,
    #[arg(
        long = "operating-item",
        value_parser = parse_cost_item,
        help = "Operating cost line item as LABEL=AMOUNT; repeatable"
    )]
    operating_items: Vec<CostItem>,
    #[arg(long, default_value_t = 10.0, help = "Analysis horizon in years")]
    horizon_years: f64,
    #[arg(long, default_value_t = 3000.0, help = "Operating hours per year")]
    operating_hours_per_year: f64,
    #[arg(long, default_value_t = 95.0, help = "Quality yield in percent")]
    quality_yield_pct: f64,
    #[arg(long, default_value_t = 98.0, help = "Performance yield (OEE) in percent")]
    performance_yield_pct: f64,
    #[arg(long, default_value_t = 2.5, help = "Expected annual inflation in percent")]
    inflation_pct: f64,
    #[arg(long, default_value_t = 4.0, help = "Annual CO2 price increase in percent")]
    co2_escalation_pct: f64,

    #[arg(
        long,
        value_enum,
        default_value_t = CliDisposalPolicy::HorizonEnd,
        help = "Book reman disposal once at the horizon or at every reman cycle as well"
    )]
    disposal_policy: CliDisposalPolicy,
    #[arg(long, help = "TOML scenario file; values in the file override flags")]
    scenario: Option<PathBuf>,
    #[arg(long, help = "Omit the per-point timeline series from the output")]
    summary_only: bool,
}

#[derive(Copy, Clone, Debug)]
struct ApiOptions {
    summary_only: bool,
}

#[derive(Debug)]
struct ApiRequest {
    parameters: ParameterSet,
    breakdown: Vec<CostBreakdown>,
    options: ApiOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CostBreakdown {
    field: &'static str,
    effective: f64,
    items: Vec<CostItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    parameters: ParameterSet,
    cost_breakdown: Vec<CostBreakdown>,
    real_rate_new: f64,
    real_rate_reman: f64,
    new_part_events: Vec<Event>,
    reman_events: Vec<Event>,
    summary: Summary,
    comparisons: StaticComparisons,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<Vec<SeriesPoint>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn parse_cost_item(raw: &str) -> Result<CostItem, String> {
    let (label, amount) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected LABEL=AMOUNT, got '{raw}'"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("missing label in '{raw}'"));
    }
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount in '{raw}': {e}"))?;
    Ok(CostItem::new(label, amount))
}

fn cost_sources(cli: &Cli) -> [(&'static str, CostSource); 4] {
    [
        (
            "acquisitionCost",
            CostSource::new(cli.acquisition_cost, cli.acquisition_items.clone()),
        ),
        (
            "commissioningCost",
            CostSource::new(cli.commissioning_cost, cli.commissioning_items.clone()),
        ),
        (
            "operatingCostPerYear",
            CostSource::new(cli.operating_cost_per_year, cli.operating_items.clone()),
        ),
        (
            "remanCost",
            CostSource::new(cli.reman_cost, cli.reman_items.clone()),
        ),
    ]
}

fn cost_breakdown(cli: &Cli) -> Vec<CostBreakdown> {
    cost_sources(cli)
        .into_iter()
        .filter(|(_, source)| matches!(source, CostSource::Itemized(_)))
        .map(|(field, source)| CostBreakdown {
            field,
            effective: source.effective_value(),
            items: source.items().to_vec(),
        })
        .collect()
}

fn build_parameters(cli: &Cli) -> Result<ParameterSet, ParameterError> {
    for (flag, items) in [
        ("--acquisition-item", &cli.acquisition_items),
        ("--commissioning-item", &cli.commissioning_items),
        ("--operating-item", &cli.operating_items),
        ("--reman-item", &cli.reman_items),
    ] {
        if let Some(bad) = items.iter().find(|item| !item.amount.is_finite()) {
            return Err(ParameterError::InvalidItem {
                flag,
                label: bad.label.clone(),
            });
        }
    }

    let [(_, acquisition), (_, commissioning), (_, operating), (_, reman)] = cost_sources(cli);

    let params = ParameterSet {
        acquisition_cost: acquisition.effective_value(),
        commissioning_cost: commissioning.effective_value(),
        disposal_new: cli.disposal_new,
        co2_unit_cost_new: cli.co2_unit_cost_new,
        service_life_new_days: cli.service_life_new_days,
        lead_time_new_days: cli.lead_time_new_days,
        discount_rate_new_pct: cli.discount_rate_new_pct,
        distance_new_km: cli.distance_new_km,
        output_rate_new: cli.output_rate_new,
        reman_cost: reman.effective_value(),
        disposal_reman: cli.disposal_reman,
        co2_unit_cost_reman: cli.co2_unit_cost_reman,
        reman_escalation_pct: cli.reman_escalation_pct,
        service_life_reman_days: cli.service_life_reman_days,
        lead_time_reman_days: cli.lead_time_reman_days,
        discount_rate_reman_pct: cli.discount_rate_reman_pct,
        distance_reman_km: cli.distance_reman_km,
        output_rate_reman: cli.output_rate_reman,
        operating_cost_per_year: operating.effective_value(),
        horizon_years: cli.horizon_years,
        operating_hours_per_year: cli.operating_hours_per_year,
        quality_yield_pct: cli.quality_yield_pct,
        performance_yield_pct: cli.performance_yield_pct,
        inflation_pct: cli.inflation_pct,
        co2_escalation_pct: cli.co2_escalation_pct,
        disposal_policy: cli.disposal_policy.into(),
    };

    validate_parameters(&params)?;
    Ok(params)
}

fn validate_parameters(p: &ParameterSet) -> Result<(), ParameterError> {
    for (flag, value) in [
        ("--acquisition-cost", p.acquisition_cost),
        ("--commissioning-cost", p.commissioning_cost),
        ("--disposal-new", p.disposal_new),
        ("--co2-unit-cost-new", p.co2_unit_cost_new),
        ("--service-life-new-days", p.service_life_new_days),
        ("--lead-time-new-days", p.lead_time_new_days),
        ("--discount-rate-new-pct", p.discount_rate_new_pct),
        ("--distance-new-km", p.distance_new_km),
        ("--output-rate-new", p.output_rate_new),
        ("--reman-cost", p.reman_cost),
        ("--disposal-reman", p.disposal_reman),
        ("--co2-unit-cost-reman", p.co2_unit_cost_reman),
        ("--reman-escalation-pct", p.reman_escalation_pct),
        ("--service-life-reman-days", p.service_life_reman_days),
        ("--lead-time-reman-days", p.lead_time_reman_days),
        ("--discount-rate-reman-pct", p.discount_rate_reman_pct),
        ("--distance-reman-km", p.distance_reman_km),
        ("--output-rate-reman", p.output_rate_reman),
        ("--operating-cost-per-year", p.operating_cost_per_year),
        ("--horizon-years", p.horizon_years),
        ("--operating-hours-per-year", p.operating_hours_per_year),
        ("--quality-yield-pct", p.quality_yield_pct),
        ("--performance-yield-pct", p.performance_yield_pct),
        ("--inflation-pct", p.inflation_pct),
        ("--co2-escalation-pct", p.co2_escalation_pct),
    ] {
        if !value.is_finite() {
            return Err(ParameterError::NotFinite { flag });
        }
    }

    for (flag, value) in [
        ("--service-life-new-days", p.service_life_new_days),
        ("--lead-time-new-days", p.lead_time_new_days),
        ("--distance-new-km", p.distance_new_km),
        ("--output-rate-new", p.output_rate_new),
        ("--co2-unit-cost-new", p.co2_unit_cost_new),
        ("--service-life-reman-days", p.service_life_reman_days),
        ("--lead-time-reman-days", p.lead_time_reman_days),
        ("--distance-reman-km", p.distance_reman_km),
        ("--output-rate-reman", p.output_rate_reman),
        ("--co2-unit-cost-reman", p.co2_unit_cost_reman),
        ("--operating-hours-per-year", p.operating_hours_per_year),
    ] {
        if value < 0.0 {
            return Err(ParameterError::Negative { flag });
        }
    }

    // Zero keeps the no-events case.
    for (strategy, period_days) in [
        ("new-part", p.service_life_new_days + p.lead_time_new_days),
        ("reman", p.service_life_reman_days + p.lead_time_reman_days),
    ] {
        if period_days > 0.0 && period_days < MIN_PERIOD_DAYS {
            return Err(ParameterError::PeriodTooShort {
                strategy,
                min_days: MIN_PERIOD_DAYS,
            });
        }
    }

    if !(0.0..=MAX_HORIZON_YEARS).contains(&p.horizon_years) {
        return Err(ParameterError::OutOfRange {
            flag: "--horizon-years",
            min: 0.0,
            max: MAX_HORIZON_YEARS,
        });
    }

    if p.operating_hours_per_year > HOURS_PER_YEAR {
        return Err(ParameterError::OutOfRange {
            flag: "--operating-hours-per-year",
            min: 0.0,
            max: HOURS_PER_YEAR,
        });
    }

    for (flag, value) in [
        ("--quality-yield-pct", p.quality_yield_pct),
        ("--performance-yield-pct", p.performance_yield_pct),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(ParameterError::OutOfRange {
                flag,
                min: 0.0,
                max: 100.0,
            });
        }
    }

    for (flag, value) in [
        ("--discount-rate-new-pct", p.discount_rate_new_pct),
        ("--discount-rate-reman-pct", p.discount_rate_reman_pct),
        ("--inflation-pct", p.inflation_pct),
        ("--co2-escalation-pct", p.co2_escalation_pct),
    ] {
        if value <= -100.0 {
            return Err(ParameterError::RateTooLow { flag });
        }
    }

    Ok(())
}

fn default_cli_for_api() -> Cli {
    Cli::parse_from([BIN_NAME])
}

/// Payload values replace whatever `cli` holds. A scalar cost drops the items
/// collected so far for that field; items given alongside it still win.
fn apply_payload(cli: &mut Cli, payload: SimulatePayload) -> ApiOptions {
    if let Some(v) = payload.acquisition_cost {
        cli.acquisition_cost = v;
        cli.acquisition_items.clear();
    }
    if let Some(v) = payload.acquisition_cost_items {
        cli.acquisition_items = v;
    }
    if let Some(v) = payload.commissioning_cost {
        cli.commissioning_cost = v;
        cli.commissioning_items.clear();
    }
    if let Some(v) = payload.commissioning_cost_items {
        cli.commissioning_items = v;
    }
    if let Some(v) = payload.disposal_new {
        cli.disposal_new = v;
    }
    if let Some(v) = payload.co2_unit_cost_new {
        cli.co2_unit_cost_new = v;
    }
    if let Some(v) = payload.service_life_new_days {
        cli.service_life_new_days = v;
    }
    if let Some(v) = payload.lead_time_new_days {
        cli.lead_time_new_days = v;
    }
    if let Some(v) = payload.discount_rate_new_pct {
        cli.discount_rate_new_pct = v;
    }
    if let Some(v) = payload.distance_new_km {
        cli.distance_new_km = v;
    }
    if let Some(v) = payload.output_rate_new {
        cli.output_rate_new = v;
    }

    if let Some(v) = payload.reman_cost {
        cli.reman_cost = v;
        cli.reman_items.clear();
    }
    if let Some(v) = payload.reman_cost_items {
        cli.reman_items = v;
    }
    if let Some(v) = payload.disposal_reman {
        cli.disposal_reman = v;
    }
    if let Some(v) = payload.co2_unit_cost_reman {
        cli.co2_unit_cost_reman = v;
    }
    if let Some(v) = payload.reman_escalation_pct {
        cli.reman_escalation_pct = v;
    }
    if let Some(v) = payload.service_life_reman_days {
        cli.service_life_reman_days = v;
    }
    if let Some(v) = payload.lead_time_reman_days {
        cli.lead_time_reman_days = v;
    }
    if let Some(v) = payload.discount_rate_reman_pct {
        cli.discount_rate_reman_pct = v;
    }
    if let Some(v) = payload.distance_reman_km {
        cli.distance_reman_km = v;
    }
    if let Some(v) = payload.output_rate_reman {
        cli.output_rate_reman = v;
    }

    if let Some(v) = payload.operating_cost_per_year {
        cli.operating_cost_per_year = v;
        cli.operating_items.clear();
    }
    if let Some(v) = payload.operating_cost_items {
        cli.operating_items = v;
    }
    if let Some(v) = payload.horizon_years {
        cli.horizon_years = v;
    }
    if let Some(v) = payload.operating_hours_per_year {
        cli.operating_hours_per_year = v;
    }
    if let Some(v) = payload.quality_yield_pct {
        cli.quality_yield_pct = v;
    }
    if let Some(v) = payload.performance_yield_pct {
        cli.performance_yield_pct = v;
    }
    if let Some(v) = payload.inflation_pct {
        cli.inflation_pct = v;
    }
    if let Some(v) = payload.co2_escalation_pct {
        cli.co2_escalation_pct = v;
    }

    if let Some(v) = payload.disposal_policy {
        cli.disposal_policy = v.into();
    }
    if let Some(v) = payload.summary_only {
        cli.summary_only = v;
    }

    ApiOptions {
        summary_only: cli.summary_only,
    }
}

fn api_request_from_cli(cli: &Cli) -> Result<ApiRequest, ParameterError> {
    Ok(ApiRequest {
        parameters: build_parameters(cli)?,
        breakdown: cost_breakdown(cli),
        options: ApiOptions {
            summary_only: cli.summary_only,
        },
    })
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, ParameterError> {
    let mut cli = default_cli_for_api();
    let options = apply_payload(&mut cli, payload);
    let mut request = api_request_from_cli(&cli)?;
    request.options = options;
    Ok(request)
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn build_simulate_response(request: ApiRequest, result: SimulationResult) -> SimulateResponse {
    SimulateResponse {
        parameters: request.parameters,
        cost_breakdown: request.breakdown,
        real_rate_new: result.real_rate_new,
        real_rate_reman: result.real_rate_reman,
        new_part_events: result.new_part_events,
        reman_events: result.reman_events,
        summary: result.summary,
        comparisons: result.comparisons,
        series: if request.options.summary_only {
            None
        } else {
            Some(result.series)
        },
    }
}

fn run_request(request: ApiRequest) -> SimulateResponse {
    let result = simulate(&request.parameters);
    build_simulate_response(request, result)
}

/// Parses command-line arguments, runs one simulation and prints the JSON result.
pub fn run_cli<I, T>(args: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let mut cli = Cli::parse_from(args);
    if let Some(path) = cli.scenario.clone() {
        let payload = load_scenario(&path)?;
        apply_payload(&mut cli, payload);
    }

    let request = api_request_from_cli(&cli)?;
    let response = run_request(request);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/defaults", get(defaults_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("REMAN TCO HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn defaults_handler() -> Response {
    match build_parameters(&default_cli_for_api()) {
        Ok(params) => json_response(StatusCode::OK, params),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn simulate_post_handler(
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    json_response(StatusCode::OK, run_request(request))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn defaults_match_reference_scenario() {
        let params = build_parameters(&sample_cli()).expect("defaults are valid");
        assert_approx(params.acquisition_cost, 50_000.0);
        assert_approx(params.commissioning_cost, 15_000.0);
        assert_approx(params.operating_cost_per_year, 8_000.0);
        assert_approx(params.service_life_new_days, 1460.0);
        assert_approx(params.lead_time_reman_days, 45.0);
        assert_approx(params.horizon_years, 10.0);
        assert_eq!(params.disposal_policy, DisposalPolicy::HorizonEnd);
    }

    #[test]
    fn itemized_acquisition_cost_overrides_scalar() {
        let mut cli = sample_cli();
        cli.acquisition_cost = 99_999.0;
        cli.acquisition_items = vec![CostItem::new("A", 100.0), CostItem::new("B", 50.0)];

        let params = build_parameters(&cli).expect("valid inputs");
        assert_approx(params.acquisition_cost, 150.0);
        assert_approx(params.commissioning_cost, 15_000.0);

        let breakdown = cost_breakdown(&cli);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].field, "acquisitionCost");
        assert_approx(breakdown[0].effective, 150.0);
    }

    #[test]
    fn cli_flags_collect_repeated_items() {
        let cli = Cli::try_parse_from([
            BIN_NAME,
            "--reman-item",
            "Cleaning=4000",
            "--reman-item",
            "Regrinding=11000.5",
            "--horizon-years",
            "12",
        ])
        .expect("flags should parse");

        let params = build_parameters(&cli).expect("valid inputs");
        assert_approx(params.reman_cost, 15_000.5);
        assert_approx(params.horizon_years, 12.0);
    }

    #[test]
    fn parse_cost_item_splits_on_last_equals() {
        let item = parse_cost_item("Seal kit=a=b=120.5").expect("valid item");
        assert_eq!(item.label, "Seal kit=a=b");
        assert_approx(item.amount, 120.5);

        assert!(parse_cost_item("no amount").is_err());
        assert!(parse_cost_item("=10").is_err());
        assert!(parse_cost_item("Label=ten").is_err());
    }

    #[test]
    fn build_parameters_rejects_yield_above_hundred() {
        let mut cli = sample_cli();
        cli.quality_yield_pct = 101.0;

        let err = build_parameters(&cli).expect_err("must reject yield > 100");
        assert!(err.to_string().contains("--quality-yield-pct"));
    }

    #[test]
    fn build_parameters_rejects_negative_service_life() {
        let mut cli = sample_cli();
        cli.service_life_reman_days = -1.0;

        let err = build_parameters(&cli).expect_err("must reject negative days");
        assert_eq!(
            err,
            ParameterError::Negative {
                flag: "--service-life-reman-days"
            }
        );
    }

    #[test]
    fn build_parameters_rejects_sub_day_cycle() {
        let mut cli = sample_cli();
        cli.service_life_new_days = 0.0;
        cli.lead_time_new_days = 0.0001;

        let err = build_parameters(&cli).expect_err("must reject sub-day period");
        assert_eq!(
            err,
            ParameterError::PeriodTooShort {
                strategy: "new-part",
                min_days: MIN_PERIOD_DAYS,
            }
        );

        let mut cli = sample_cli();
        cli.service_life_reman_days = 0.5;
        cli.lead_time_reman_days = 0.0;
        let err = build_parameters(&cli).expect_err("must reject half-day reman cycle");
        assert!(err.to_string().starts_with("reman service life"));
    }

    #[test]
    fn build_parameters_accepts_zero_period_as_no_events() {
        let mut cli = sample_cli();
        cli.service_life_reman_days = 0.0;
        cli.lead_time_reman_days = 0.0;
        assert!(build_parameters(&cli).is_ok());

        cli.lead_time_reman_days = 1.0;
        assert!(build_parameters(&cli).is_ok());
    }

    #[test]
    fn build_parameters_rejects_non_finite_values() {
        let mut cli = sample_cli();
        cli.operating_cost_per_year = f64::NAN;

        let err = build_parameters(&cli).expect_err("must reject NaN");
        assert!(err.to_string().contains("--operating-cost-per-year"));
    }

    #[test]
    fn build_parameters_rejects_non_finite_item() {
        let mut cli = sample_cli();
        cli.operating_items = vec![CostItem::new("Energy", f64::INFINITY)];

        let err = build_parameters(&cli).expect_err("must reject infinite item");
        assert!(err.to_string().contains("Energy"));
    }

    #[test]
    fn build_parameters_rejects_inflation_at_minus_hundred() {
        let mut cli = sample_cli();
        cli.inflation_pct = -100.0;

        let err = build_parameters(&cli).expect_err("must reject -100% inflation");
        assert!(err.to_string().contains("--inflation-pct"));
    }

    #[test]
    fn build_parameters_accepts_negative_disposal_credit() {
        let mut cli = sample_cli();
        cli.disposal_new = -3_000.0;

        let params = build_parameters(&cli).expect("credits are valid");
        assert_approx(params.disposal_new, -3_000.0);
    }

    #[test]
    fn api_request_from_json_parses_keys_items_and_policy() {
        let json = r#"{
          "acquisitionCost": 70000,
          "operatingCostItems": [
            {"label": "Energy", "amount": 5000},
            {"label": "Maintenance", "amount": 1500}
          ],
          "remanEscalationPct": 5,
          "horizonYears": 15,
          "disposalPolicy": "every-cycle",
          "summaryOnly": true
        }"#;

        let request = api_request_from_json(json).expect("json should parse");
        let params = request.parameters;
        assert_approx(params.acquisition_cost, 70_000.0);
        assert_approx(params.operating_cost_per_year, 6_500.0);
        assert_approx(params.reman_escalation_pct, 5.0);
        assert_approx(params.horizon_years, 15.0);
        assert_eq!(params.disposal_policy, DisposalPolicy::EveryCycle);
        assert!(request.options.summary_only);
        assert_eq!(request.breakdown.len(), 1);
        assert_eq!(request.breakdown[0].field, "operatingCostPerYear");
    }

    #[test]
    fn api_request_from_json_reports_validation_errors() {
        let err = api_request_from_json(r#"{"horizonYears": -1}"#).expect_err("must reject");
        assert!(err.contains("--horizon-years"));
    }

    #[test]
    fn api_request_from_json_rejects_unknown_policy() {
        let err = api_request_from_json(r#"{"disposalPolicy": "sometimes"}"#)
            .expect_err("must reject unknown policy");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let request = api_request_from_cli(&sample_cli()).expect("valid inputs");
        let response = run_request(request);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"parameters\""));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"finalTcoReman\""));
        assert!(json.contains("\"savingsPercent\""));
        assert!(json.contains("\"comparisons\""));
        assert!(json.contains("\"staticTotal\""));
        assert!(json.contains("\"remanEvents\""));
        assert!(json.contains("\"series\""));
        assert!(json.contains("\"costPerOutputReman\""));
        assert!(json.contains("\"disposalPolicy\":\"horizon-end\""));
    }

    #[test]
    fn summary_only_response_omits_series() {
        let mut cli = sample_cli();
        cli.summary_only = true;

        let request = api_request_from_cli(&cli).expect("valid inputs");
        let response = run_request(request);
        assert!(response.series.is_none());
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(!json.contains("\"series\""));
    }

    #[test]
    fn scenario_payload_overrides_flags() {
        let mut cli = Cli::try_parse_from([BIN_NAME, "--horizon-years", "5"])
            .expect("flags should parse");
        let payload = parse_scenario("horizonYears = 7\nremanCost = 20000")
            .expect("scenario should parse");
        apply_payload(&mut cli, payload);

        let params = build_parameters(&cli).expect("valid inputs");
        assert_approx(params.horizon_years, 7.0);
        assert_approx(params.reman_cost, 20_000.0);
    }

    #[test]
    fn scenario_scalar_cost_replaces_flag_items() {
        let mut cli = Cli::try_parse_from([
            BIN_NAME,
            "--acquisition-item",
            "Housing=1",
            "--reman-item",
            "Cleaning=4000",
        ])
        .expect("flags should parse");
        let payload = parse_scenario("acquisitionCost = 5").expect("scenario should parse");
        apply_payload(&mut cli, payload);

        let params = build_parameters(&cli).expect("valid inputs");
        assert_approx(params.acquisition_cost, 5.0);
        assert_approx(params.reman_cost, 4_000.0);
        assert!(cost_breakdown(&cli).iter().all(|b| b.field != "acquisitionCost"));
    }

    #[test]
    fn scenario_items_win_over_scalar_in_same_file() {
        let mut cli = sample_cli();
        let payload = parse_scenario(
            "remanCost = 1\n[[remanCostItems]]\nlabel = \"Cleaning\"\namount = 300",
        )
        .expect("scenario should parse");
        apply_payload(&mut cli, payload);

        let params = build_parameters(&cli).expect("valid inputs");
        assert_approx(params.reman_cost, 300.0);
    }

    #[tokio::test]
    async fn malformed_json_body_gets_json_error() {
        use axum::body::{Body, to_bytes};
        use axum::extract::FromRequest;
        use axum::http::Request;

        let request = Request::builder()
            .method("POST")
            .uri("/api/simulate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"horizonYears\": "))
            .expect("request should build");
        let rejected = Json::<SimulatePayload>::from_request(request, &()).await;
        assert!(rejected.is_err());

        let response = simulate_post_handler(rejected).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let body = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body should read");
        let parsed: serde_json::Value = serde_json::from_slice(&body).expect("body is JSON");
        assert!(parsed["error"].as_str().is_some_and(|e| !e.is_empty()));
    }
}
