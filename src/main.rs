use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracepath_ng::{Args, Result, RunConfig, TraceOutcome, Tracer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Hop lines go to stdout; logging stays on stderr so the two never mix.
    tracing_subscriber::fmt()
        .with_env_filter("tracepath_ng=info")
        .with_writer(std::io::stderr)
        .init();

    info!("starting tracepath-ng v{}", env!("CARGO_PKG_VERSION"));
    info!("target: {}", args.target);

    let config = RunConfig::from(&args);
    let cancel = CancellationToken::new();
    let tracer = Tracer::new(config, cancel.clone());
    let mut prober = tokio::task::spawn_blocking(move || tracer.run());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, cancelling trace");
            cancel.cancel();
            // The prober notices cancellation at the next hop boundary
            // (worst case one reply timeout later); join it so the socket
            // is torn down before exit.
            let _ = prober.await;
        }
        joined = &mut prober => {
            match joined? {
                Ok(TraceOutcome::TargetReached { hop }) => {
                    info!("target reached in {hop} hops");
                }
                Ok(TraceOutcome::MaxHopsExceeded) => {
                    println!("hop budget exhausted without reaching target");
                }
                Ok(TraceOutcome::Cancelled) => {}
                Err(e) => println!("{e}"),
            }
        }
    }

    Ok(())
}
