// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT license.

//! Low-level bindings to the `libtorque` client library.
//!
//! [TORQUE](https://adaptivecomputing.com/) is a PBS-derived resource manager
//! for scheduling and running jobs on large computing clusters. It is often
//! used in scientific HPC (high-performance computing) contexts.
//!
//! These bindings cover the `pbs_ifl.h` subset needed to connect to a server,
//! submit and delete jobs, and query status. They provide nothing beyond the
//! barest minimum needed to interface to the C code unsafely. Use a
//! higher-level Rust crate in application code.
//!
//! Nothing is linked unless the `link` feature is enabled.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

extern crate libc;

use libc::{c_char, c_int, c_uint};

pub type batch_op = c_uint;
pub const batch_op_SET: batch_op = 0;
pub const batch_op_UNSET: batch_op = 1;
pub const batch_op_INCR: batch_op = 2;
pub const batch_op_DECR: batch_op = 3;
pub const batch_op_EQ: batch_op = 4;
pub const batch_op_NE: batch_op = 5;
pub const batch_op_GE: batch_op = 6;
pub const batch_op_GT: batch_op = 7;
pub const batch_op_LE: batch_op = 8;
pub const batch_op_LT: batch_op = 9;
pub const batch_op_DFLT: batch_op = 10;
pub const batch_op_MERGE: batch_op = 11;

pub const PBSE_FLOOR: c_int = 15000;
pub const PBSE_UNKJOBID: c_int = 15001;
pub const PBSE_SYSTEM: c_int = 15010;
pub const PBSE_NOSERVER: c_int = 15034;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct attrl {
    pub next: *mut attrl,
    pub name: *mut c_char,
    pub resource: *mut c_char,
    pub value: *mut c_char,
    pub op: batch_op,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct attropl {
    pub next: *mut attropl,
    pub name: *mut c_char,
    pub resource: *mut c_char,
    pub value: *mut c_char,
    pub op: batch_op,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct batch_status {
    pub next: *mut batch_status,
    pub name: *mut c_char,
    pub attribs: *mut attrl,
    pub text: *mut c_char,
}

extern "C" {
    pub static mut pbs_errno: c_int;

    pub fn pbs_connect(server: *mut c_char) -> c_int;
    pub fn pbs_default() -> *mut c_char;
    pub fn pbs_deljob(connect: c_int, job_id: *mut c_char, extend: *mut c_char) -> c_int;
    pub fn pbs_disconnect(connect: c_int) -> c_int;
    pub fn pbs_statfree(stat: *mut batch_status);
    pub fn pbs_statjob(
        connect: c_int,
        id: *mut c_char,
        attrib: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status;
    pub fn pbs_statnode(
        connect: c_int,
        id: *mut c_char,
        attrib: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status;
    pub fn pbs_statque(
        connect: c_int,
        id: *mut c_char,
        attrib: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status;
    pub fn pbs_statserver(connect: c_int, attrib: *mut attrl, extend: *mut c_char) -> *mut batch_status;
    pub fn pbs_submit(
        connect: c_int,
        attrib: *mut attropl,
        script: *mut c_char,
        destination: *mut c_char,
        extend: *mut c_char,
    ) -> *mut c_char;
}
