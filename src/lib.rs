// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Interface to the TORQUE/PBS batch job scheduler.

This crate is the client side of a session with a PBS server: it connects,
submits and deletes jobs, and queries the status of jobs, nodes, queues, and
the server. Requests are given as lists of `AttributeRequest`s and responses
come back as lists of `StatusResult`s; the linked C records that the server
library actually speaks are built and torn down in `codec`.

The native library is reached through the `Native` trait. With the
`system-torque` feature, `LibTorque` is the real thing and
`Connection::connect` uses it.

*/

extern crate failure;
#[macro_use] extern crate failure_derive;
extern crate itertools;
extern crate libc;
extern crate torque_sys;
#[macro_use] extern crate tracing;

pub mod codec;
pub mod error;
pub mod model;
pub mod native;
pub mod session;

pub use error::{describe, PbsError, FALLBACK_DESCRIPTION};
pub use model::{Attribute, AttributeRequest, BatchOp, StatusResult};
pub use native::Native;
#[cfg(feature = "system-torque")]
pub use native::LibTorque;
pub use session::{default_server, Connection};
