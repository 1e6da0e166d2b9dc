// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! The boundary with the native client library.

Every call we make into `libtorque` goes through the `Native` trait, so that
the marshaling and session logic can be exercised against a stand-in. The
real implementation, `LibTorque`, is only available with the
`system-torque` feature.

All of these calls share one `pbs_errno` register. Callers in this crate
serialize them through the session lock; see `session`.

*/

use libc::{c_char, c_int};
use torque_sys::{attrl, attropl, batch_status};


/// The native client library's call surface.
///
/// # Safety
///
/// The methods take and return raw pointers with C ownership rules.
/// String arguments are NUL-terminated or null where the C API permits.
/// Status chains returned by the `stat_*` methods must be released with
/// `free_status` exactly once; strings returned by `submit` must be released
/// with `free_string` exactly once. Attribute chains passed in remain owned
/// by the caller.
pub trait Native {
    unsafe fn connect(&self, server: *mut c_char) -> c_int;

    /// The returned string is static storage inside the library.
    unsafe fn default_server(&self) -> *mut c_char;

    unsafe fn disconnect(&self, connection: c_int) -> c_int;

    unsafe fn delete_job(&self, connection: c_int, job_id: *mut c_char, extend: *mut c_char) -> c_int;

    unsafe fn submit(
        &self,
        connection: c_int,
        attribs: *mut attropl,
        script: *mut c_char,
        destination: *mut c_char,
        extend: *mut c_char,
    ) -> *mut c_char;

    unsafe fn stat_job(
        &self,
        connection: c_int,
        id: *mut c_char,
        attribs: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status;

    unsafe fn stat_node(
        &self,
        connection: c_int,
        id: *mut c_char,
        attribs: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status;

    unsafe fn stat_queue(
        &self,
        connection: c_int,
        id: *mut c_char,
        attribs: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status;

    unsafe fn stat_server(&self, connection: c_int, attribs: *mut attrl, extend: *mut c_char) -> *mut batch_status;

    unsafe fn free_status(&self, status: *mut batch_status);

    unsafe fn free_string(&self, s: *mut c_char);

    /// Read the shared error register left by the most recent call.
    unsafe fn last_error(&self) -> c_int;
}


/// The real `libtorque`.
#[cfg(feature = "system-torque")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LibTorque;

#[cfg(feature = "system-torque")]
impl Native for LibTorque {
    unsafe fn connect(&self, server: *mut c_char) -> c_int {
        ::torque_sys::pbs_connect(server)
    }

    unsafe fn default_server(&self) -> *mut c_char {
        ::torque_sys::pbs_default()
    }

    unsafe fn disconnect(&self, connection: c_int) -> c_int {
        ::torque_sys::pbs_disconnect(connection)
    }

    unsafe fn delete_job(&self, connection: c_int, job_id: *mut c_char, extend: *mut c_char) -> c_int {
        ::torque_sys::pbs_deljob(connection, job_id, extend)
    }

    unsafe fn submit(
        &self,
        connection: c_int,
        attribs: *mut attropl,
        script: *mut c_char,
        destination: *mut c_char,
        extend: *mut c_char,
    ) -> *mut c_char {
        ::torque_sys::pbs_submit(connection, attribs, script, destination, extend)
    }

    unsafe fn stat_job(
        &self,
        connection: c_int,
        id: *mut c_char,
        attribs: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status {
        ::torque_sys::pbs_statjob(connection, id, attribs, extend)
    }

    unsafe fn stat_node(
        &self,
        connection: c_int,
        id: *mut c_char,
        attribs: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status {
        ::torque_sys::pbs_statnode(connection, id, attribs, extend)
    }

    unsafe fn stat_queue(
        &self,
        connection: c_int,
        id: *mut c_char,
        attribs: *mut attrl,
        extend: *mut c_char,
    ) -> *mut batch_status {
        ::torque_sys::pbs_statque(connection, id, attribs, extend)
    }

    unsafe fn stat_server(&self, connection: c_int, attribs: *mut attrl, extend: *mut c_char) -> *mut batch_status {
        ::torque_sys::pbs_statserver(connection, attribs, extend)
    }

    unsafe fn free_status(&self, status: *mut batch_status) {
        ::torque_sys::pbs_statfree(status)
    }

    /// `pbs_submit` hands back a `malloc`ed job id.
    unsafe fn free_string(&self, s: *mut c_char) {
        ::libc::free(s as *mut ::libc::c_void)
    }

    unsafe fn last_error(&self) -> c_int {
        ::torque_sys::pbs_errno
    }
}
