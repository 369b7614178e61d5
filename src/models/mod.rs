//! EODH API model types.

mod ades;
mod catalog;
mod collection;
mod item;
mod job;
mod link;
mod process;
mod search;

pub use ades::*;
pub use catalog::*;
pub use collection::*;
pub use item::*;
pub use job::*;
pub use link::*;
pub use process::*;
pub use search::*;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// STAC version written into created documents.
pub const STAC_VERSION: &str = "1.0.0";

/// `current` serialized, with the top-level fields of `changes` written over it.
pub(crate) fn overlay<T: Serialize, P: Serialize>(current: &T, changes: &P) -> Result<Value> {
    let mut body = serde_json::to_value(current)?;
    if let (Value::Object(base), Value::Object(changes)) = (&mut body, serde_json::to_value(changes)?) {
        base.extend(changes);
    }
    Ok(body)
}
