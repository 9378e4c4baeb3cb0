use anyhow::Result;
use tracing::{error, info};

use cyklist::aws::{self, AutoscalingClient, Ec2Client};
use cyklist::config::Config;
use cyklist::drain::KubectlDrainer;
use cyklist::lifecycle::{Lifecycle, RunOutcome, RunSettings};
use cyklist::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args();
    logging::init(&config.log_format, &config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT"),
        build_date = env!("BUILD_DATE"),
        "cyklist starting"
    );

    let phase = match config.validate() {
        Ok(phase) => phase,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let sdk_config = aws::load_sdk_config(config.region.as_deref()).await;
    let ec2 = Ec2Client::new(&sdk_config);
    let autoscaling = AutoscalingClient::new(&sdk_config);
    let drainer = KubectlDrainer::new(config.kubectl_path.clone(), config.drain_timeout());

    if let Err(e) = ec2.test_connectivity().await {
        error!(error = %e, region = ec2.region(), "Unable to reach EC2 API");
        std::process::exit(1);
    }
    config.display(ec2.region());

    let settings = RunSettings {
        phase,
        enable_tag: config.enable_tag.clone(),
        control_tag: config.control_tag.clone(),
        max_instances: config.max_instances,
        list_only: config.list_only,
        exclude_image_id: config.exclude_image_id.clone(),
        min_age: config.min_age(),
    };
    let lifecycle = Lifecycle::new(&ec2, &autoscaling, &drainer, settings);

    tokio::select! {
        result = lifecycle.run() => match result {
            Ok(RunOutcome::NothingToDo) => info!("Nothing to do"),
            Ok(outcome) => info!(outcome = ?outcome, "Run finished"),
            Err(e) => {
                error!(error = %e, phase = %phase, "Lifecycle run failed");
                std::process::exit(1);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            error!(
                phase = %phase,
                "Interrupted, requests already sent are left to complete on the AWS side"
            );
            std::process::exit(130);
        }
    }

    Ok(())
}
