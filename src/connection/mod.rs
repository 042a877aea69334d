mod blocking;
mod lifecycle;
mod ops;
mod session;
mod worker;

pub use lifecycle::Connection;
