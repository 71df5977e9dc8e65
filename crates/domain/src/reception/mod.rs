//! Reception lifecycle: the open/close state machine and LIFO parcel intake.

mod service;
mod state;

pub use service::ReceptionService;
pub use state::ReceptionState;
