//! Client-side state for filebox: the checked-file selection and the
//! listing view state.
//!
//! Everything here is plain data with value semantics. Mutation happens by
//! producing a new value, which lets callers snapshot state by cloning and
//! detect changes by identity.

mod load_state;
mod selection;

pub use load_state::LoadState;
pub use selection::SelectionSet;
