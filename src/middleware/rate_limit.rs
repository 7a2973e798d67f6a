use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use serde_json::json;

const WINDOW: Duration = Duration::from_secs(1);

/// Requests admitted in the window that opened at `opened`.
#[derive(Debug)]
struct Admissions {
    opened: Instant,
    admitted: u32,
}

/// Caps the generation API at `limit` requests per second, shared by every
/// request routed through one router.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    limit: u32,
    admissions: Arc<Mutex<Admissions>>,
}

impl RateLimiter {
    pub fn per_second(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            admissions: Arc::new(Mutex::new(Admissions {
                opened: Instant::now(),
                admitted: 0,
            })),
        }
    }

    /// Admits a request arriving at `now`, or returns how long until the
    /// current window closes.
    fn admit(&self, now: Instant) -> Result<(), Duration> {
        let mut admissions = self.admissions.lock();
        let elapsed = now.saturating_duration_since(admissions.opened);
        if elapsed >= WINDOW {
            *admissions = Admissions {
                opened: now,
                admitted: 0,
            };
        } else if admissions.admitted >= self.limit {
            return Err(WINDOW - elapsed);
        }
        admissions.admitted += 1;
        Ok(())
    }
}

fn too_many_requests(retry_after: Duration) -> Response {
    // Retry-After only carries whole seconds.
    let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    let mut resp = (
        StatusCode::TOO_MANY_REQUESTS,
        axum::Json(json!({
            "success": false,
            "error": "Too many requests, please retry shortly",
            "kind": "rate_limited",
        })),
    )
        .into_response();
    resp.headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(seconds.max(1)));
    resp
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match limiter.admit(Instant::now()) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(
                path = %req.uri().path(),
                limit = limiter.limit,
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            too_many_requests(retry_after)
        }
    }
}
