//! The resume/portfolio document model and its editor reducer.
//!
//! `model` is pure data: the ordered section list, the id → content map, and
//! the styling record. `reducer` is the only code allowed to mutate a
//! `Document` in response to user intents. Neither submodule performs I/O.

pub mod handlers;
pub mod model;
pub mod reducer;
