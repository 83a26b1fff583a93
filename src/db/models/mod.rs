mod waitlist;

pub use waitlist::*;
