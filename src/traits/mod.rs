//! Trait definitions shared by the resource types.
//!
//! [`Linked`] gives every document uniform access to its hyperlinks and
//! [`Update`] is implemented by the entities the APIs allow modifying.

mod linked;
mod update;

pub use linked::Linked;
pub use update::Update;
