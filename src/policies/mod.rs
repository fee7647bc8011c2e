mod traits;
mod naive;
mod balanced;
mod random;

pub use traits::{SolveConfig, SolvingPolicy};
pub use naive::Naive;
pub use balanced::Balanced;
pub use random::RandomPolicy;
