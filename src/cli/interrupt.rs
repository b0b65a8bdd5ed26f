use std::thread;

use tracing::warn;

use crate::explorer::explorer::CancelFlag;

/// Cancel `flag` on the first Ctrl-C so the run ends with a partial report;
/// exit immediately on the second.
///
/// Signals are awaited on a dedicated thread with its own single-threaded
/// runtime.
pub fn install_interrupt_handler(flag: CancelFlag) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("interrupt".into())
        .spawn(move || {
            runtime.block_on(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                warn!("interrupt received, stopping after the current action");
                flag.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("second interrupt, exiting");
                    std::process::exit(130);
                }
            });
        })?;
    Ok(())
}
