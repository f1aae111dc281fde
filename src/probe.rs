//! TCP reachability probe for installed cache servers

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

/// Per-attempt connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Poll `address:port` until a TCP connection succeeds or `deadline` passes
pub async fn wait_for_port(
    address: &str,
    port: u16,
    deadline: Duration,
    interval: Duration,
) -> bool {
    let target = format!("{}:{}", address, port);
    let give_up = Instant::now() + deadline;

    loop {
        match timeout(CONNECT_TIMEOUT, TcpStream::connect(&target)).await {
            Ok(Ok(_)) => return true,
            Ok(Err(e)) => debug!("{} not open yet: {}", target, e),
            Err(_) => debug!("{} connect timed out", target),
        }

        if Instant::now() + interval >= give_up {
            return false;
        }
        sleep(interval).await;
    }
}
