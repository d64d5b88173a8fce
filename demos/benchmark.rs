//! Times the scripted workload under every selected backend.
//!
//! ```text
//! cargo run --release --example benchmark [workload.toml]
//! ```
//!
//! Prints one line per backend with the total milliseconds of each testcase.
//! Set `RUST_LOG=fitalloc=debug` to watch pools being set up and torn down.

use std::{path::PathBuf, process::ExitCode};

use fitalloc::Workload;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let workload = match std::env::args_os().nth(1).map(PathBuf::from) {
    Some(path) => match Workload::from_file(&path) {
      Ok(workload) => workload,
      Err(e) => {
        tracing::error!("{e}");
        return ExitCode::FAILURE;
      }
    },
    None => Workload::default(),
  };

  println!(
    "{} testcases x {} iterations, {} allocations of {} bytes, pool {} bytes",
    workload.testcases,
    workload.iterations,
    workload.allocations,
    workload.allocation_size,
    workload.capacity,
  );

  for backend in workload.backends() {
    match workload.run(backend) {
      Ok(totals) => {
        let millis: Vec<String> = totals
          .iter()
          .map(|total| format!("{:.3}", total.as_secs_f64() * 1000.0))
          .collect();
        println!("{backend:>10}: {} ms", millis.join(" "));
      }
      Err(e) => {
        tracing::error!("{backend} failed: {e}");
        return ExitCode::FAILURE;
      }
    }
  }

  ExitCode::SUCCESS
}
