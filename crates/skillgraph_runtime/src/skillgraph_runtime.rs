// Skillgraph Runtime - Executes skill graphs during combat
//
// The runtime walks a read-only graph: push-based along signal
// connections (one node per step, suspended between steps until the
// host calls proceed), pull-based along value connections (on-demand,
// uncached). All per-run state lives in one Scheduler + RuntimeContext
// pair; graphs and the node catalog are shared between runs.

pub mod context;
pub mod error;
pub mod eval;
pub mod nodes;
pub mod registry;
pub mod scheduler;
pub mod stats;

pub use context::{AdjacencySnapshot, Direction, RuntimeContext, Subject};
pub use error::{EvalError, NodeFault};
pub use eval::Evaluator;
pub use registry::{NodeBehavior, NodeRegistry, NoopBehavior, PortValues};
pub use scheduler::Scheduler;
pub use stats::{CharacterId, InMemoryStats, StatAccess, StatValue};
