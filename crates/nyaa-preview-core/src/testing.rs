//! Scripted transport for network-free tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::Transport;
use crate::error::FetchFailure;
use crate::fetcher::RemoteFetcher;
use crate::types::RemoteResponse;

/// One scripted answer, consumed in order
#[derive(Debug, Clone)]
pub enum Step {
    Respond { status: u16, body: String },
    Delayed { millis: u64, status: u16, body: String },
    Fail(FetchFailure),
    Hang,
}

impl Step {
    pub fn respond(status: u16, body: &str) -> Self {
        Step::Respond {
            status,
            body: body.to_string(),
        }
    }

    pub fn delayed(millis: u64, status: u16, body: &str) -> Self {
        Step::Delayed {
            millis,
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn fetcher(self: &Arc<Self>) -> RemoteFetcher {
        RemoteFetcher::new(self.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RemoteResponse, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());
        let step = self.steps.lock().unwrap().pop_front();

        let respond = |status: u16, body: String| RemoteResponse {
            status,
            url: url.to_string(),
            body: body.into(),
        };

        match step {
            Some(Step::Respond { status, body }) => Ok(respond(status, body)),
            Some(Step::Delayed {
                millis,
                status,
                body,
            }) => {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(respond(status, body))
            }
            Some(Step::Fail(failure)) => Err(failure),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(FetchFailure::Transport("no scripted response".to_string())),
        }
    }
}
