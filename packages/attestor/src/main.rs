//! Cosmic Bridge Attestor Node
//!
//! Reads transfers (one `TransferView` JSON object per line) on stdin, as
//! produced by polling the bridge's `Transfers` query, and writes a
//! `SubmitAttestation` execute message (JSON, one per line) on stdout for
//! every transfer it approves. Logs go to stderr.
//!
//! A transfer whose submission is refused stays pending on the bridge and is
//! signed again once its in-flight entry expires (`ATTESTOR_CACHE_TTL_SECS`).

use cosmic_attestor::{AmountPolicy, Attestor, Config, Outcome, TransferView};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    info!("Starting Cosmic Bridge Attestor");

    let config = Config::load()?;
    let mut attestor = Attestor::from_config(&config, AmountPolicy::default())?;
    info!(
        bridge = %config.bridge_contract,
        verifier = %attestor.verifier_address(),
        nonce_start = config.nonce_start,
        decrypt_bound_bits = config.decrypt_bound_bits,
        volume_bound_bits = config.volume_bound_bits,
        "Configuration loaded"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = wait_for_shutdown_signal() => break,
        };
        let Some(line) = line else {
            info!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let transfer: TransferView = match serde_json::from_str(&line) {
            Ok(transfer) => transfer,
            Err(e) => {
                warn!(error = %e, "Skipping malformed transfer line");
                continue;
            }
        };

        match attestor.process(&transfer)? {
            Outcome::Submit(msg) => {
                let mut out = serde_json::to_vec(&msg)?;
                out.push(b'\n');
                stdout.write_all(&out).await?;
                stdout.flush().await?;
            }
            Outcome::Skipped { reason } => {
                debug!(transfer_id = transfer.id, %reason, "Skipped");
            }
            Outcome::Rejected { reason } => {
                info!(transfer_id = transfer.id, %reason, "Rejected");
            }
            Outcome::Deferred { reason } => {
                info!(transfer_id = transfer.id, %reason, "Deferred");
            }
        }
    }

    let (cached, max) = attestor.cache_info();
    info!(
        next_nonce = attestor.next_nonce(),
        cached, max, "Cosmic Bridge Attestor stopped"
    );
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cosmic_attestor=debug"));

    // stdout carries the attestation messages
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
