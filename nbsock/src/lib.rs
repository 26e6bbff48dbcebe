//
// nbsock - logical blocking sockets over non-blocking descriptors
//
// Every descriptor this crate opens stays in non-blocking mode at the OS
// level; "blocking" calls are bounded poll-then-syscall loops driven by a
// per-operation deadline. See the module headers for the individual pieces.
//

// Public modules and re-exports
pub mod addr;
pub mod buffer;
pub mod deadline;
pub mod error;
pub mod select;
pub mod socket;
pub mod wait;

pub use addr::{Address, PeerAddr};
pub use deadline::Deadline;
pub use error::{Result, SocketError};
pub use select::{MAX_SELECT_FDS, select_fds};
pub use socket::{Kind, Socket};
pub use wait::{Interest, Readiness, wait_ready};

// Operation impls on Socket, hidden from documentation
#[doc(hidden)]
pub mod connect;
#[doc(hidden)]
pub mod recv;
#[doc(hidden)]
pub mod send;
