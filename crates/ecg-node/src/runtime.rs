//! # Node Runtime
//!
//! Owns the shared infrastructure (event bus, record store, content store)
//! and the background tasks consuming ledger events.
//!
//! ## Startup Sequence
//!
//! 1. Create the event bus and the record ledger publishing onto it
//! 2. Open the JSONL event log
//! 3. Bind the REST gateway, if enabled
//! 4. Spawn the alert listener
//! 5. Spawn the verification worker
//! 6. Spawn the gateway server
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown to all tasks
//! 2. Wait for each task to flush and report (bounded by [`SHUTDOWN_GRACE`])

use crate::adapters::InMemoryContentStore;
use crate::config::NodeConfig;
use crate::gateway::{self, GatewayState, NodeDispatcher};
use crate::handlers::{request_filter, VerificationHandler, VerifierStats};
use anyhow::{Context, Result};
use ecg_01_record_ledger::adapters::{
    BusEventSink, ChaincodeDispatcher, InMemoryRecordStore, TxContext,
};
use ecg_01_record_ledger::errors::RecordError;
use ecg_01_record_ledger::service::{RecordService, ServiceStats};
use ecg_02_alert_listener::adapters::{ConsoleAlertSink, JsonlEventLog};
use ecg_02_alert_listener::ports::outbound::AlertSink;
use ecg_02_alert_listener::service::{AlertListener, ListenerStats};
use shared_bus::InMemoryEventBus;
use shared_types::identity::Identity;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long shutdown waits for each task.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The record ledger as wired by the node.
pub type LedgerService = RecordService<InMemoryRecordStore, BusEventSink<InMemoryEventBus>>;

/// Final counters from every component.
#[derive(Debug, Default, Clone)]
pub struct ShutdownReport {
    pub ledger: ServiceStats,
    pub listener: Option<ListenerStats>,
    pub verifier: Option<VerifierStats>,
}

/// The running node.
pub struct NodeRuntime {
    config: NodeConfig,
    bus: Arc<InMemoryEventBus>,
    ledger: Arc<LedgerService>,
    dispatcher: Arc<NodeDispatcher>,
    content: Arc<InMemoryContentStore>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    listener_task: Option<JoinHandle<ListenerStats>>,
    verifier_task: Option<JoinHandle<VerifierStats>>,
    gateway_task: Option<JoinHandle<()>>,
    gateway_addr: Option<SocketAddr>,
}

impl NodeRuntime {
    /// Create the runtime. No tasks run until [`NodeRuntime::start`].
    pub fn new(config: NodeConfig) -> Self {
        info!("Creating ECG ledger node runtime");

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let ledger = Arc::new(RecordService::new(
            InMemoryRecordStore::new(),
            BusEventSink::new(Arc::clone(&bus), config.contract_name()),
            config.policy.clone(),
        ));
        let dispatcher = Arc::new(ChaincodeDispatcher::new(Arc::clone(&ledger)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            bus,
            ledger,
            dispatcher,
            content: Arc::new(InMemoryContentStore::new()),
            shutdown_tx,
            shutdown_rx,
            listener_task: None,
            verifier_task: None,
            gateway_task: None,
            gateway_addr: None,
        }
    }

    /// Start the background tasks, printing alerts to stdout.
    pub async fn start(&mut self) -> Result<()> {
        self.start_with_sink(ConsoleAlertSink).await
    }

    /// Start the background tasks, delivering alerts to `sink`.
    pub async fn start_with_sink<A: AlertSink + 'static>(&mut self, sink: A) -> Result<()> {
        info!("===========================================");
        info!("  ECG Record Ledger Node v{}", crate::VERSION);
        info!("===========================================");

        let path = &self.config.listener.event_log_path;
        let log = JsonlEventLog::open(path)
            .await
            .with_context(|| format!("Failed to open event log {}", path.display()))?;

        let gateway_listener = if self.config.gateway.enabled {
            let addr = self.config.gateway.addr;
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind gateway on {addr}"))?;
            self.gateway_addr = Some(listener.local_addr()?);
            Some(listener)
        } else {
            None
        };

        let listener = AlertListener::new(
            self.bus.subscribe(self.config.listener.filter()),
            log,
            sink,
        );
        self.listener_task = Some(tokio::spawn(listener.run(self.shutdown_rx.clone())));

        let verifier = VerificationHandler::new(
            self.bus.subscribe(request_filter(self.config.contract_name())),
            Arc::clone(&self.content),
            Arc::clone(&self.ledger),
            self.config.verifier_identity.clone(),
        );
        self.verifier_task = Some(tokio::spawn(verifier.run(self.shutdown_rx.clone())));

        if let Some(listener) = gateway_listener {
            let state = self.gateway_state();
            let shutdown = self.shutdown_rx.clone();
            self.gateway_task = Some(tokio::spawn(async move {
                if let Err(e) = gateway::serve(listener, state, shutdown).await {
                    error!(error = %e, "Gateway server failed");
                }
            }));
        }

        info!(
            contract = self.config.contract_name(),
            event_log = %path.display(),
            verifier = %self.config.verifier_identity,
            "Node started"
        );
        Ok(())
    }

    /// Invoke a chaincode function as `caller` in a fresh transaction.
    pub fn invoke<S: AsRef<str>>(
        &self,
        caller: &Identity,
        function: &str,
        args: &[S],
    ) -> Result<String, RecordError> {
        let ctx = TxContext::now(caller.clone());
        self.dispatcher.invoke(&ctx, function, args)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    pub fn ledger(&self) -> Arc<LedgerService> {
        Arc::clone(&self.ledger)
    }

    pub fn content(&self) -> Arc<InMemoryContentStore> {
        Arc::clone(&self.content)
    }

    /// State for gateway handlers, sharing this node's dispatcher.
    pub fn gateway_state(&self) -> GatewayState {
        GatewayState::new(Arc::clone(&self.dispatcher), Arc::clone(&self.content))
    }

    /// Address the gateway is bound to, once started.
    pub fn gateway_addr(&self) -> Option<SocketAddr> {
        self.gateway_addr
    }

    /// Shutdown the node gracefully and collect final counters.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let listener = join("alert listener", self.listener_task.take()).await;
        let verifier = join("verification worker", self.verifier_task.take()).await;
        join("gateway", self.gateway_task.take()).await;
        // Read last so confirmations made while draining are counted.
        let report = ShutdownReport {
            ledger: self.ledger.stats(),
            listener,
            verifier,
        };

        info!("Shutdown complete");
        report
    }
}

async fn join<T>(name: &str, task: Option<JoinHandle<T>>) -> Option<T> {
    let task = task?;
    match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
        Ok(Ok(stats)) => Some(stats),
        Ok(Err(e)) => {
            error!(task = name, error = %e, "Task failed");
            None
        }
        Err(_) => {
            warn!(task = name, "Task did not stop in time");
            None
        }
    }
}
