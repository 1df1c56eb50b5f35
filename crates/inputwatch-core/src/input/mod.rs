//! Raw input vocabulary and the in-process input hub.
//!
//! - **`raw`** – [`raw::RawInputEvent`], the platform-neutral description of a
//!   single keyboard or mouse event.  Key identifiers follow the DOM
//!   `KeyboardEvent.key` naming (`"Shift"`, `"a"`, `"ArrowUp"`, ...).
//! - **`hub`** – [`hub::InputHub`], where platform adapters publish events and
//!   where services attach their listeners.

pub mod hub;
pub mod raw;
