mod http;

use std::future::Future;
use std::net::SocketAddr;
use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use tokio::net::TcpListener;

use crate::domain::{BenchmarkConfig, Scheme, Target};
use crate::error::{AppError, AppResult};

const TEST_TIMEOUT: Duration = Duration::from_secs(2);

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn permission_denied(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::PermissionDenied
}

/// Binds a loopback listener; `None` when the sandbox forbids binding.
async fn bind_listener(label: &str) -> AppResult<Option<(TcpListener, SocketAddr)>> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if permission_denied(&err) => return Ok(None),
        Err(err) => {
            return Err(AppError::validation(format!(
                "Failed to bind {} server: {}",
                label, err
            )));
        }
    };
    let addr = listener
        .local_addr()
        .map_err(|err| AppError::validation(format!("Failed to read {} addr: {}", label, err)))?;
    Ok(Some((listener, addr)))
}

/// Single-worker, single-request config pointed at `addr`.
fn config_for(scheme: Scheme, addr: SocketAddr) -> AppResult<BenchmarkConfig> {
    let one_worker =
        NonZeroUsize::new(1).ok_or_else(|| AppError::validation("Expected non-zero value"))?;
    let one_request =
        NonZeroU64::new(1).ok_or_else(|| AppError::validation("Expected non-zero value"))?;
    Ok(BenchmarkConfig::new(
        Target::new(scheme, addr.ip().to_string(), addr.port()),
        one_worker,
        one_request,
    )
    .with_timeout(Some(TEST_TIMEOUT)))
}
