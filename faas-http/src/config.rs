//! Adapter configuration - process-wide settings.
//!
//! Set once at bring-up, shared by every invocation.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use faas_http_core::Error;

use crate::handler::BoxFuture;
use crate::pipeline::ErrorHandler;

/// An external dependency the process needs before serving calls,
/// such as a database handle or a broker connection.
///
/// Resources are started once, in registration order, before the adapter
/// accepts its first invocation.
pub trait Resource: Send + Sync {
    fn name(&self) -> &str;

    fn start<'a>(&'a self, ctx: &'a StartContext) -> BoxFuture<'a, Result<(), Error>>;
}

/// What every resource sees while the adapter starts.
///
/// The deadline is shared by all resources of one bring-up. It is advisory:
/// the adapter does not cancel a resource that overruns it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartContext {
    deadline: Option<SystemTime>,
}

impl StartContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: SystemTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline
    }

    /// Time left for bring-up. `Some(ZERO)` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = self.deadline?;
        Some(
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        )
    }
}

/// Bring-up failure. Fatal to the process, never routed through the error
/// pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("failed to start resource {name}: {source}")]
    Resource {
        name: String,
        #[source]
        source: Error,
    },
}

/// Adapter-wide configuration.
#[derive(Clone, Default)]
pub(crate) struct AdapterConfig {
    /// Started in order by `start_resources`.
    pub resources: Vec<Arc<dyn Resource>>,
    /// Turns errors into responses.
    pub error_handler: ErrorHandler,
    /// Budget for starting every resource, measured from `start_resources`.
    pub start_timeout: Option<Duration>,
}

impl AdapterConfig {
    /// Start every resource in order, stopping at the first failure.
    pub async fn start_resources(&self) -> Result<(), StartError> {
        let mut ctx = StartContext::new();
        if let Some(timeout) = self.start_timeout {
            ctx = ctx.with_deadline(SystemTime::now() + timeout);
        }

        for resource in &self.resources {
            let name = resource.name();
            tracing::info!(resource = name, "starting resource");
            resource.start(&ctx).await.map_err(|source| {
                tracing::error!(resource = name, error = %source, "resource failed to start");
                StartError::Resource {
                    name: name.to_string(),
                    source,
                }
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.resources.iter().map(|r| r.name()).collect();
        f.debug_struct("AdapterConfig")
            .field("resources", &names)
            .field("error_handler", &self.error_handler)
            .field("start_timeout", &self.start_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        started: Arc<Mutex<Vec<&'static str>>>,
        deadlines: Arc<Mutex<Vec<Option<SystemTime>>>>,
        fail: bool,
    }

    impl Resource for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn start<'a>(&'a self, ctx: &'a StartContext) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                self.started.lock().unwrap().push(self.name);
                self.deadlines.lock().unwrap().push(ctx.deadline());
                if self.fail {
                    Err(Error::msg("connection refused"))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn config(specs: &[(&'static str, bool)], started: &Arc<Mutex<Vec<&'static str>>>) -> AdapterConfig {
        AdapterConfig {
            resources: specs
                .iter()
                .map(|&(name, fail)| {
                    Arc::new(Recorder {
                        name,
                        started: started.clone(),
                        deadlines: Arc::default(),
                        fail,
                    }) as Arc<dyn Resource>
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_resources_start_in_order() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let cfg = config(&[("db", false), ("queue", false)], &started);
        cfg.start_resources().await.unwrap();
        assert_eq!(*started.lock().unwrap(), ["db", "queue"]);
    }

    #[tokio::test]
    async fn test_resource_failure_stops_bring_up() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let cfg = config(&[("db", true), ("queue", false)], &started);
        let err = cfg.start_resources().await.unwrap_err();

        assert_eq!(*started.lock().unwrap(), ["db"]);
        let StartError::Resource { name, source } = &err;
        assert_eq!(name, "db");
        assert_eq!(source.to_string(), "connection refused");
        assert_eq!(
            err.to_string(),
            "failed to start resource db: connection refused"
        );
    }

    #[tokio::test]
    async fn test_resources_share_start_deadline() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let deadlines = Arc::new(Mutex::new(Vec::new()));
        let recorder = |name| {
            Arc::new(Recorder {
                name,
                started: started.clone(),
                deadlines: deadlines.clone(),
                fail: false,
            }) as Arc<dyn Resource>
        };
        let cfg = AdapterConfig {
            resources: vec![recorder("db"), recorder("queue")],
            start_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let before = SystemTime::now();
        cfg.start_resources().await.unwrap();

        let deadlines = deadlines.lock().unwrap();
        assert_eq!(deadlines.len(), 2);
        assert_eq!(deadlines[0], deadlines[1]);
        let deadline = deadlines[0].unwrap();
        assert!(deadline >= before + Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_start_context_without_timeout() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let deadlines = Arc::new(Mutex::new(Vec::new()));
        let cfg = AdapterConfig {
            resources: vec![Arc::new(Recorder {
                name: "db",
                started,
                deadlines: deadlines.clone(),
                fail: false,
            }) as Arc<dyn Resource>],
            ..Default::default()
        };
        cfg.start_resources().await.unwrap();
        assert_eq!(*deadlines.lock().unwrap(), [None]);
    }

    #[test]
    fn test_start_context_remaining() {
        assert_eq!(StartContext::new().remaining(), None);
        let past = StartContext::new().with_deadline(SystemTime::UNIX_EPOCH);
        assert_eq!(past.remaining(), Some(Duration::ZERO));
        let future = StartContext::new().with_deadline(SystemTime::now() + Duration::from_secs(60));
        assert!(future.remaining().unwrap() > Duration::from_secs(50));
    }

    #[test]
    fn test_debug_lists_resource_names() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let cfg = config(&[("db", false)], &started);
        assert!(format!("{cfg:?}").contains("\"db\""));
    }
}
