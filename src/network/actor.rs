//! Network actor - runs endpoint calls and profile fetches in the Tokio runtime

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::{create_client, execute_call, fetch_profile, load_spec};

/// Tracks an in-flight endpoint call for cancellation
struct ActiveCall {
    cancel_tx: oneshot::Sender<()>,
}

/// Network actor that processes endpoint, profile and document commands
pub struct NetworkActor {
    client: reqwest::Client,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
    cancel_handles: HashMap<u64, ActiveCall>,
}

impl NetworkActor {
    pub fn new(response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            client: create_client(),
            response_tx,
            active_requests: JoinSet::new(),
            cancel_handles: HashMap::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                // Handle incoming commands
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::CallEndpoint { id, request }) => {
                            let (cancel_tx, mut cancel_rx) = oneshot::channel();
                            self.cancel_handles.insert(id, ActiveCall { cancel_tx });

                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();

                            self.active_requests.spawn(async move {
                                tracing::info!(id, url = %request.url, method = %request.method, "Calling endpoint");
                                tokio::select! {
                                    biased;
                                    _ = &mut cancel_rx => {}
                                    result = execute_call(&client, request, id) => {
                                        tracing::info!(id, "Call finished");
                                        let _ = response_tx.send(result);
                                    }
                                }
                            });
                        }

                        Some(NetworkCommand::FetchProfile { id, key }) => {
                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();

                            self.active_requests.spawn(async move {
                                let result = fetch_profile(&client, key, id).await;
                                let _ = response_tx.send(result);
                            });
                        }

                        Some(NetworkCommand::RefreshProfileAfter { id, key, delay_ms }) => {
                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();

                            // Server-side balances settle shortly after a call
                            self.active_requests.spawn(async move {
                                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                                let result = fetch_profile(&client, key, id).await;
                                let _ = response_tx.send(result);
                            });
                        }

                        Some(NetworkCommand::LoadSpec { id, source }) => {
                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();

                            self.active_requests.spawn(async move {
                                tracing::info!(id, source = %source, "Loading api document");
                                let result = load_spec(&client, source, id).await;
                                let _ = response_tx.send(result);
                            });
                        }

                        Some(NetworkCommand::CancelRequest(id)) => {
                            if let Some(active) = self.cancel_handles.remove(&id) {
                                tracing::info!(id, "Cancelling request");
                                let _ = active.cancel_tx.send(());
                                let _ = self.response_tx.send(NetworkResponse::Cancelled { id });
                            }
                        }

                        Some(NetworkCommand::Shutdown) => {
                            // Cancel all active requests
                            for (_, active) in self.cancel_handles.drain() {
                                let _ = active.cancel_tx.send(());
                            }
                            break;
                        }

                        None => break,
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {
                    // Task completed - cleanup is handled by the tasks themselves
                }
            }
        }
    }
}
