pub mod event;
pub mod session;
pub mod ticket;

pub use event::{
    Event, EventDetail, EventFilter, EventPatch, ImageUpload, Location, NewEvent,
    DEFAULT_EVENT_STATUS,
};
pub use session::Session;
pub use ticket::Ticket;
