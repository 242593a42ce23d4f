// Omniflow execution engine
// Template interpolation, per-step execution and pipeline orchestration

//! # Execution Engine
//!
//! The engine layer between the domain models and the injected
//! collaborators. It is organized leaves-first:
//!
//! - [`template`]: path resolution and `{{path}}` interpolation over
//!   `serde_json::Value` trees
//! - [`params`]: merging caller inputs with declared parameter defaults
//! - [`sse`]: the Server-Sent-Events framing heuristic used by streaming
//!   steps
//! - [`executor`]: builds and dispatches one component's HTTP call
//! - [`orchestrator`]: runs components in order, threads the shared
//!   context, applies retry/continue-on-error policy
//! - [`storage`]: repository traits for app and session definitions
//!
//! All mutable run state lives in the per-run [`Context`]; the engine holds
//! no global state, so independent pipeline runs may execute concurrently.

pub mod executor;
pub mod orchestrator;
pub mod params;
pub mod sse;
pub mod storage;
pub mod template;

/// The mapping of scope names to values available for template resolution
/// at a given point in a run
///
/// Contains system entries (`$session_id`, `$timestamp`, `env`), any
/// caller-provided entries (`$messages`, `$history`, ...), and one entry per
/// completed step (`<id>`, `<id>_response`, or `<id>_error` on failure).
/// Created at run start, mutated only by the orchestrator, discarded when
/// the run ends.
pub type Context = serde_json::Map<String, serde_json::Value>;
