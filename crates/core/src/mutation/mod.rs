pub mod types;

pub use types::{Mutation, MutationError, MutationResult};
