use anyhow::Result;
use log::{info, warn};

use newton_schulz_fit::{config::SimulationConfig, plot, sweep::Sweep};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimulationConfig::from_env()?;
    let sweep = Sweep::new(config)?;
    info!("running {} configurations", sweep.config().grid().count());

    let outcome = sweep.run();

    println!("=== summary ===");
    for row in &outcome.table {
        println!("{row}");
    }

    if outcome.failed > 0 {
        warn!("{} configurations failed", outcome.failed);
    }

    let Some(last) = outcome.last else {
        return Ok(());
    };

    let path = &sweep.config().plot_path;
    match plot::plot_loss_history(&last.loss_history, path) {
        Ok(()) => println!("\nloss curve written to {}", path.display()),
        Err(e) => {
            warn!("skipping loss curve: {e}");
            println!("\nnotice: {e}");
        }
    }

    Ok(())
}
