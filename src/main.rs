use std::env;
use std::process;

const DEFAULT_PORT: u16 = 8080;
const SERVE_USAGE: &str = "Usage: reman-tco serve [port]";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let result = if args.get(1).is_some_and(|arg| arg == "serve") {
        serve(args.get(2).map(String::as_str)).await
    } else {
        reman_tco::api::run_cli(args).map_err(|e| format!("Error: {e}"))
    };

    if let Err(msg) = result {
        eprintln!("{msg}");
        process::exit(1);
    }
}

async fn serve(port_arg: Option<&str>) -> Result<(), String> {
    let port = match port_arg {
        None => DEFAULT_PORT,
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| format!("Invalid port '{raw}'\n{SERVE_USAGE}"))?,
    };
    reman_tco::api::run_http_server(port)
        .await
        .map_err(|e| format!("Server error: {e}"))
}
