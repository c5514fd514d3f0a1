//! Context-aware structured logging for server processes.
//!
//! Every log line is enriched with ambient correlation data (trace/span/user
//! identifiers, arbitrary key-value context) established earlier in the call
//! chain, without threading that data through every function signature.
//!
//! # Architecture Overview
//!
//! ```text
//!   Request boundary                     Application code
//!   ┌──────────────────┐                ┌──────────────────────┐
//!   │ http adapters    │  LogContext    │ log::info!(..)       │
//!   │ (extract/inject  │──── enter ────▶│ inside open scopes   │
//!   │  trace headers)  │                └──────────┬───────────┘
//!   └──────────────────┘                           │ LogEvent
//!                                                  ▼
//!   ┌──────────────────┐  snapshot      ┌──────────────────────┐
//!   │ context store    │───────────────▶│ enrichment           │
//!   │ (per-thread/task │                │ (native > extras >   │
//!   │  layer stack +   │                │  context)            │
//!   │  shared defaults)│                └──────────┬───────────┘
//!   └──────────────────┘                           │ EnrichedRecord
//!                                                  ▼
//!   ┌──────────────────┐                ┌──────────────────────┐
//!   │ signals          │   level        │ renderer             │
//!   │ SIGUSR1 → INFO   │──── gate ─────▶│ structured JSON or   │
//!   │ SIGUSR2 → DEBUG  │                │ plaintext line       │
//!   └──────────────────┘                └──────────┬───────────┘
//!                                                  ▼
//!                                         stdout / stderr / writer
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use ctxlog::{setup_logging, LogContext};
//!
//! setup_logging().expect("logging setup failed");
//!
//! let _guard = LogContext::new().with_value("trace_id", 123).enter();
//! log::info!("something happened"); // rendered with "trace_id": 123
//! ```

// Core
pub mod context;
pub mod record;
pub mod render;
pub mod value;

// Process wiring
pub mod setup;
pub mod sink;

// Cross-cutting concerns
pub mod http;
pub mod result;
mod signals;

pub use context::{
    current_context, current_value, generate_trace_id, reset_defaults, set_default, ContextFuture,
    ContextGuard, FutureExt, LogContext,
};
pub use record::{enrich, EnrichedRecord, LogEvent, Severity};
pub use result::LogResult;
pub use setup::{setup_logging, LogSetup, SetupError};
pub use sink::{add_sink, LogDestination};
pub use value::{canonicalize, plain_repr, ContextValue};
