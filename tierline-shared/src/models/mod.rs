pub mod events;
pub mod offers;
