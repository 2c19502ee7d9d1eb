//! In-process identity broker and target API speaking the same HTTP contract
//! as the real backend. Used by the integration tests and the `fake_idp` binary.

mod error;
mod handler;
mod router;
mod state;
mod token;

pub use error::{ErrorBody, IdpError, recover_error};
pub use router::{mounted, routes};
pub use state::*;
pub use token::JwtConfig;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct FakeIdp {
    addr: SocketAddr,
    prefix: String,
    state: Arc<FakeIdpState>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FakeIdp {
    /// Bind `addr` (port 0 picks a free one) and serve in the background.
    /// Must be called from within a tokio runtime.
    pub fn spawn(state: Arc<FakeIdpState>, addr: SocketAddr, prefix: &str) -> anyhow::Result<Self> {
        let cancel = CancellationToken::new();
        let signal = {
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        };
        let (addr, server) = warp::serve(mounted(state.clone(), prefix))
            .try_bind_with_graceful_shutdown(addr, signal)?;
        let handle = tokio::spawn(server);
        info!(%addr, prefix, "fake identity provider listening");

        Ok(FakeIdp {
            addr,
            prefix: prefix.trim_matches('/').to_string(),
            state,
            cancel,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL clients should be configured with, including the mount prefix.
    pub fn base_url(&self) -> String {
        if self.prefix.is_empty() {
            format!("http://{}/", self.addr)
        } else {
            format!("http://{}/{}/", self.addr, self.prefix)
        }
    }

    pub fn state(&self) -> &Arc<FakeIdpState> {
        &self.state
    }

    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = match self.handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!(addr = %self.addr, "fake identity provider stopped");
    }
}

impl Drop for FakeIdp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
