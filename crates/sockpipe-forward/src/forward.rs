//! Listener loop and per-connection relay setup.
//!
//! The forwarder:
//! 1. Binds one TCP listener per rule
//! 2. Accepts a connection and dials the rule's target (with timeout)
//! 3. Wraps both sockets as relay endpoints
//! 4. Relays until either side closes or fails
//!
//! Shutdown stops the listeners only. Established relays run until one of
//! their endpoints terminates.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sockpipe_core::io::{Relay, RelayReport, StreamEndpoint};
use tokio::net::{TcpListener, TcpStream, lookup_host};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::{ForwardConfig, RuleConfig};
use crate::error::ForwardError;

/// Listeners bound for every rule, ready to accept.
pub struct Forwarder {
    config: Arc<ForwardConfig>,
    listeners: Vec<(RuleConfig, TcpListener)>,
}

impl Forwarder {
    /// Validate `config` and bind all listeners.
    pub async fn bind(config: ForwardConfig) -> Result<Self, ForwardError> {
        config.validate()?;

        let mut listeners = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            let listener = TcpListener::bind(rule.listen).await?;
            listeners.push((rule.clone(), listener));
        }

        Ok(Self {
            config: Arc::new(config),
            listeners,
        })
    }

    /// Bound addresses, in rule order.
    pub fn local_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        self.listeners
            .iter()
            .map(|(_, listener)| listener.local_addr())
            .collect()
    }

    /// Accept connections on every listener until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ForwardError> {
        let mut rules = JoinSet::new();
        for (rule, listener) in self.listeners {
            info!(
                rule = %rule.name,
                listen = %listener.local_addr()?,
                target = %rule.target,
                "forward rule started"
            );
            rules.spawn(serve_rule(
                rule,
                listener,
                self.config.clone(),
                shutdown.clone(),
            ));
        }

        while let Some(joined) = rules.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    shutdown.cancel();
                    return Err(e);
                }
                Err(e) => {
                    shutdown.cancel();
                    return Err(ForwardError::Io(io::Error::other(e)));
                }
            }
        }
        Ok(())
    }
}

async fn serve_rule(
    rule: RuleConfig,
    listener: TcpListener,
    config: Arc<ForwardConfig>,
    shutdown: CancellationToken,
) -> Result<(), ForwardError> {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!(rule = %rule.name, "forward rule shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer_addr) = match accept_result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(rule = %rule.name, error = %e, "accept failed");
                        continue;
                    }
                };
                let target = rule.target.clone();
                let config = config.clone();

                tokio::spawn(
                    async move {
                        match handle_connection(stream, &target, &config).await {
                            Ok(report) => log_report(&report),
                            Err(e) => {
                                warn!(target = %target, error = %e, error_type = e.error_type(), "forward failed");
                            }
                        }
                    }
                    .instrument(info_span!("forward", rule = %rule.name, peer = %peer_addr)),
                );
            }
        }
    }
}

/// Dial `target` and relay `inbound` with it until either side terminates.
pub async fn handle_connection(
    inbound: TcpStream,
    target: &str,
    config: &ForwardConfig,
) -> Result<RelayReport, ForwardError> {
    let connect_timeout = Duration::from_secs(config.timeouts.connect_timeout_secs);
    let outbound = tokio::time::timeout(connect_timeout, connect(target))
        .await
        .map_err(|_| ForwardError::ConnectTimeout(target.to_string()))??;

    let endpoint = &config.endpoint;
    if endpoint.tcp_nodelay {
        inbound.set_nodelay(true)?;
        outbound.set_nodelay(true)?;
    }
    debug!(target = %target, remote = %outbound.peer_addr()?, "target connected");

    let local = StreamEndpoint::tcp(inbound, endpoint.read_chunk_size, endpoint.soft_limit)?;
    let remote = StreamEndpoint::tcp(outbound, endpoint.read_chunk_size, endpoint.soft_limit)?;

    let relay = Relay::builder()
        .local(local)
        .remote(remote)
        .verbose(config.verbose)
        .build()?;
    Ok(relay.run().await)
}

/// Resolve `target` and connect to the first address that accepts.
async fn connect(target: &str) -> Result<TcpStream, ForwardError> {
    let addrs: Vec<SocketAddr> = lookup_host(target)
        .await
        .map_err(|source| ForwardError::Resolve {
            target: target.to_string(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(addr = %addr, error = %e, "connect attempt failed");
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(source) => ForwardError::Connect {
            target: target.to_string(),
            source,
        },
        None => ForwardError::Resolve {
            target: target.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
        },
    })
}

fn log_report(report: &RelayReport) {
    let termination = &report.termination;
    match termination.error() {
        Some(e) => debug!(
            closed_by = %termination.side,
            error = %e.source,
            sent = report.local_to_remote.bytes,
            received = report.remote_to_local.bytes,
            "connection finished with transport error"
        ),
        None => debug!(
            closed_by = %termination.side,
            sent = report.local_to_remote.bytes,
            received = report.remote_to_local.bytes,
            pauses = report.local_to_remote.pauses + report.remote_to_local.pauses,
            "connection finished"
        ),
    }
}
