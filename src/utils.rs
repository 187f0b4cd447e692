use crate::error::{Error, Result};
use std::future::Future;
use std::time::{Duration, Instant};

pub(crate) async fn poll_until<F, Fut, T>(
    mut check_fn: F,
    timeout: Duration,
    interval: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();

    loop {
        match check_fn().await? {
            Some(result) => return Ok(result),
            None => {
                if start.elapsed() >= timeout {
                    return Err(Error::PollTimeout);
                }
                tokio::time::sleep(interval).await;
            }
        }
    }
}
