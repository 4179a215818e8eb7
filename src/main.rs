use gorest_contract::runner::Runner;
use gorest_contract::{Harness, suite};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let harness = match Harness::from_env() {
        Ok(harness) => harness,
        Err(error) => {
            log::error!("Failed to set up the harness: {}", error);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Verifying {}", harness.client().endpoint());

    let filter = std::env::args().nth(1);
    let scenarios = suite::select(filter.as_deref());
    if scenarios.is_empty() {
        log::error!("No scenarios match {:?}", filter);
        return ExitCode::FAILURE;
    }

    let report = Runner::new(&harness).run(scenarios).await;
    println!("{report}");
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
