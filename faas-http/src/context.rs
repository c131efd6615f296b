//! Per-invocation execution context.
//!
//! A [`Context`] couples the [`Request`], the [`Response`] being built, the
//! host's [`Invocation`] metadata and a [`Locals`] side channel. The adapter
//! creates one per call and hands it to the chain by `&mut`; nothing in it
//! outlives the invocation.

pub mod locals;

use std::any::Any;
use std::time::{Duration, SystemTime};

pub use locals::Locals;

use crate::request::Request;
use crate::response::Response;

// ============================================================================
// Invocation - host-supplied call metadata
// ============================================================================

/// Metadata the host supplies for one call.
///
/// The deadline is advisory: nothing in the chain enforces it, handlers may
/// consult it before starting long work.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    request_id: String,
    deadline: Option<SystemTime>,
}

impl Invocation {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: SystemTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline from milliseconds since the Unix epoch, the form
    /// function hosts usually report it in.
    pub fn with_deadline_ms(self, epoch_ms: u64) -> Self {
        self.with_deadline(SystemTime::UNIX_EPOCH + Duration::from_millis(epoch_ms))
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline
    }

    /// Time left before the deadline. `Some(ZERO)` once it has passed,
    /// `None` when the host gave no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = self.deadline?;
        Some(
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        )
    }
}

// ============================================================================
// Context - what handlers and middleware receive
// ============================================================================

/// Everything one invocation of the chain works on.
#[derive(Debug)]
pub struct Context<Req, Resp> {
    pub request: Request<Req>,
    pub response: Response<Resp>,
    pub invocation: Invocation,
    pub locals: Locals,
}

impl<Req, Resp> Context<Req, Resp> {
    /// A context with a fresh `200 OK` response and empty locals.
    pub fn new(request: Request<Req>, invocation: Invocation) -> Self {
        Self {
            request,
            response: Response::new(),
            invocation,
            locals: Locals::new(),
        }
    }

    pub fn request(&self) -> &Request<Req> {
        &self.request
    }

    pub fn response(&self) -> &Response<Resp> {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response<Resp> {
        &mut self.response
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Store a value for later middleware or the handler.
    pub fn set_local<V>(&mut self, key: impl Into<String>, value: V) -> &mut Self
    where
        V: Any + Send + Sync,
    {
        self.locals.set(key, value);
        self
    }

    /// A stored value, if present and of type `V`.
    pub fn local<V: Any>(&self, key: &str) -> Option<&V> {
        self.locals.get(key)
    }

    pub fn local_any(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.locals.get_any(key)
    }

    pub fn unset_local(&mut self, key: &str) -> &mut Self {
        self.locals.remove(key);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Empty;

    fn context() -> Context<Empty, Empty> {
        Context::new(Request::builder().body(Empty {}), Invocation::new("req-1"))
    }

    #[test]
    fn test_new_context() {
        let ctx = context();
        assert_eq!(ctx.invocation().request_id(), "req-1");
        assert_eq!(ctx.response().status_code(), http::StatusCode::OK);
        assert!(ctx.locals.is_empty());
    }

    #[test]
    fn test_locals_round_trip() {
        let mut ctx = context();
        ctx.set_local("user_id", 42u64).set_local("role", "admin");
        assert_eq!(ctx.local::<u64>("user_id"), Some(&42));
        assert_eq!(ctx.local::<&str>("role"), Some(&"admin"));
        assert!(ctx.local::<String>("role").is_none());

        ctx.unset_local("role");
        assert!(ctx.local_any("role").is_none());
        assert!(ctx.local_any("user_id").is_some());
    }

    #[test]
    fn test_response_mut_chains() {
        let mut ctx = context();
        ctx.response_mut()
            .status(http::StatusCode::NO_CONTENT)
            .header("X-A", "1");
        assert_eq!(ctx.response.status_code(), http::StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_invocation_without_deadline() {
        let inv = Invocation::new("id");
        assert!(inv.deadline().is_none());
        assert!(inv.remaining().is_none());
    }

    #[test]
    fn test_invocation_remaining() {
        let inv = Invocation::new("id").with_deadline(SystemTime::now() + Duration::from_secs(60));
        let remaining = inv.remaining().unwrap();
        assert!(remaining > Duration::from_secs(50));
        assert!(remaining <= Duration::from_secs(60));
    }

    #[test]
    fn test_invocation_past_deadline_is_zero() {
        let inv = Invocation::new("id").with_deadline_ms(1_000);
        assert_eq!(inv.remaining(), Some(Duration::ZERO));
        assert_eq!(
            inv.deadline(),
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1))
        );
    }
}
