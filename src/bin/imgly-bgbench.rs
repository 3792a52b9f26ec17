//! IMG.LY Background Removal Benchmark CLI
//!
//! Command-line harness comparing background removal strategies on latency,
//! memory and mask quality over a directory of test images.

#[cfg(feature = "cli")]
use imgly_bgbench::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
