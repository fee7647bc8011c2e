// ---------- Tune-ables ---------- //
pub const MAX_ACTIONS: usize = 1_000;  // How many decisions a policy may take before we call it divergent
pub const MAX_PLANS: usize = 20_000;  // How many partial strategies the best-strategy search may score
pub const SIMULATION_RUNS: usize = 20_000;  // Playouts used when estimating a cost by sampling
pub const MAX_PLAYOUT_STEPS: usize = 100_000;  // A single playout gives up after this many moves
pub const PLACEHOLDER_PREFIX: &str = "_";  // Names cycle placeholders apart from real unknowns

// ---------- Basic types (renamed for pretty) ---------- //
pub type Size = u64;  // Face count, current size and target size of a problem
pub type NodeId = usize;  // Index of a node inside its strategy graph arena
pub type Throws = u64;
