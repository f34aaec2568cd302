//! The signal graph: module arena, connections and the pull evaluator.
//!
//! # Architecture
//!
//! [`Graph`] is an arena of module slots addressed by [`ModuleId`]. Ids are
//! handed out sequentially and never reused, so a stale id can only ever miss.
//! Each slot keeps the module's port table; a connection is nothing more than
//! a pair of back-references, one in each port, and the graph keeps both sides
//! in step on every mutation.
//!
//! # Evaluation
//!
//! Evaluation is a demand-driven recursive walk with **no caching**:
//!
//! ```text
//! pull(sink) → sink.generate → receive(in) → send(peer out) → upstream.generate → ...
//! ```
//!
//! Every pull re-walks the whole upstream subgraph. If one output feeds two
//! consumers, the upstream module is generated twice per block, and stateful
//! modules (oscillators, playheads) advance twice. Route shared signals
//! through a `split` module, which pulls its input once every n calls where
//! n is its connected output count.
//!
//! The evaluator does not check for cycles. Acyclicity is a precondition, and
//! [`Graph::connect_acyclic`] is the mutation-time check for callers that want
//! one. A module that is pulled again while it is already generating gets a
//! default block, and an error is logged.
//!
//! # Failure isolation
//!
//! A module whose `generate` returns `Err` is logged at `error` level and its
//! output is replaced with the default block for its port type. The rest of
//! the graph keeps running.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut graph = Graph::new(48000.0);
//! let osc = graph.add(Box::new(Oscillator::new(48000.0)));
//! let out = graph.add(Box::new(Endpoint::new(48000.0)));
//! graph.connect(PortId::output(osc, 0), PortId::input(out, 0))?;
//! let block = graph.pull(out, 512);
//! ```

mod io;
mod node;
mod processing;
mod splice;

pub use io::PortIo;
pub use node::ModuleId;
pub use processing::{Connection, Graph, TypeMismatch};
pub use splice::Removal;
