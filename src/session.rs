// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Sessions with a PBS server.

The native library reports errors through one process-wide register that
the next call will overwrite. Every native call made here therefore happens
while holding a single process-wide lock, and the register is read before
the lock is released. Calls on different connections contend on that same
lock.

Native calls block until the server answers. There is no timeout or
cancellation at this layer.

*/

use itertools::Itertools;
use libc::c_int;
use std::sync::{Mutex, MutexGuard};
use torque_sys::{self, attrl, attropl, batch_status};

use codec::{self, NativeString, StatusChain};
use error::PbsError;
use model::{AttributeRequest, StatusResult};
use native::Native;
#[cfg(feature = "system-torque")]
use native::LibTorque;


static NATIVE_LOCK: Mutex<()> = Mutex::new(());

/// Serialize access to the native library. The lock guards no data, so a
/// panic while holding it leaves nothing inconsistent.
fn native_lock() -> MutexGuard<'static, ()> {
    NATIVE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}


/// Get the name of the default server, as the native library would choose it.
pub fn default_server<N: Native>(native: &N) -> Option<String> {
    let _guard = native_lock();

    // Static storage inside the library: copy it, never free it.
    let p = unsafe { native.default_server() };

    if p.is_null() {
        None
    } else {
        Some(unsafe { ::std::ffi::CStr::from_ptr(p) }.to_string_lossy().into_owned())
    }
}


/// The kinds of object whose status can be queried.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StatusTarget {
    Job,
    Node,
    Queue,
    Server,
}


/// An open session with a PBS server.
///
/// The session is closed by `disconnect`, or when this value is dropped.
/// Since the value cannot be copied, a handle is never disconnected twice or
/// used after it is closed.
#[derive(Debug)]
pub struct Connection<N: Native> {
    native: N,
    handle: c_int,
    open: bool,
}

#[cfg(feature = "system-torque")]
impl Connection<LibTorque> {
    /// Connect to a server through the system `libtorque`.
    ///
    /// If `server` is `None`, the library picks its default server.
    pub fn connect(server: Option<&str>) -> Result<Self, PbsError> {
        Connection::open(LibTorque, server)
    }
}

impl<N: Native> Connection<N> {
    /// Connect to a server through the given native implementation.
    pub fn open(native: N, server: Option<&str>) -> Result<Self, PbsError> {
        let c_server = codec::to_opt_cstring("server name", server)?;

        let (handle, code) = {
            let _guard = native_lock();
            let handle = unsafe { native.connect(codec::opt_ptr(&c_server)) };
            let code = unsafe { native.last_error() };

            // Don't leak a connection slot if the library hands back a
            // handle while also signalling an error.
            if code != 0 && handle > 0 {
                unsafe { native.disconnect(handle) };
            }

            (handle, code)
        };

        if code != 0 {
            return Err(PbsError::connection(code));
        }

        if handle < 0 {
            return Err(PbsError::connection(-handle));
        }

        if handle == 0 {
            return Err(PbsError::connection(torque_sys::PBSE_NOSERVER));
        }

        debug!("connected to PBS server {} as connection {}", server.unwrap_or("(default)"), handle);
        Ok(Connection { native, handle, open: true })
    }

    /// The native connection handle.
    pub fn handle(&self) -> c_int {
        self.handle
    }

    /// Close the session.
    pub fn disconnect(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }

        self.open = false;

        let rc = {
            let _guard = native_lock();
            unsafe { self.native.disconnect(self.handle) }
        };

        if rc != 0 {
            warn!("disconnecting PBS connection {} returned {}", self.handle, rc);
        } else {
            debug!("disconnected PBS connection {}", self.handle);
        }
    }

    /// Submit a job.
    ///
    /// `resources` typically holds `Resource_List` requests; each is sent
    /// with the `SET` operator, in order. `script` is the job script path as
    /// the server expects it, and `destination` the queue. Returns the new
    /// job's identifier.
    pub fn submit(
        &self,
        resources: &[AttributeRequest],
        script: &str,
        destination: &str,
        extend: Option<&str>,
    ) -> Result<String, PbsError> {
        let chain = codec::encode_attribute_chain::<attropl>(resources)?;
        let c_script = codec::to_cstring("job script", script)?;
        let c_dest = codec::to_cstring("destination", destination)?;
        let c_extend = codec::to_opt_cstring("extend", extend)?;

        let _guard = native_lock();

        let raw = unsafe {
            self.native.submit(
                self.handle,
                chain.head(),
                c_script.as_ptr() as *mut _,
                c_dest.as_ptr() as *mut _,
                codec::opt_ptr(&c_extend),
            )
        };
        let code = unsafe { self.native.last_error() };

        // Owning the result first means it gets released on every path below.
        let job_id = unsafe { NativeString::from_raw(&self.native, raw) };

        if code != 0 {
            return Err(PbsError::submission(code));
        }

        match job_id {
            Some(s) => {
                let id = s.to_string_lossy();
                debug!("submitted job {} to {} with {} resource requests", id, destination, chain.len());
                Ok(id)
            },

            None => Err(PbsError::submission(torque_sys::PBSE_SYSTEM)),
        }
    }

    /// Delete a job.
    pub fn delete(&self, job_id: &str, extend: Option<&str>) -> Result<(), PbsError> {
        let c_id = codec::to_cstring("job id", job_id)?;
        let c_extend = codec::to_opt_cstring("extend", extend)?;

        let (rc, code) = {
            let _guard = native_lock();
            let rc = unsafe {
                self.native.delete_job(self.handle, c_id.as_ptr() as *mut _, codec::opt_ptr(&c_extend))
            };
            (rc, unsafe { self.native.last_error() })
        };

        if code != 0 {
            return Err(PbsError::deletion(code));
        }

        if rc != 0 {
            return Err(PbsError::deletion(rc));
        }

        debug!("deleted job {}", job_id);
        Ok(())
    }

    /// Get the status of jobs.
    ///
    /// `id` selects one job (or, depending on the server, an array or a
    /// queue's jobs); `None` asks for all. `filter` names the attributes to
    /// report; an empty filter asks for all of them.
    pub fn status_jobs(
        &self,
        id: Option<&str>,
        filter: &[AttributeRequest],
        extend: Option<&str>,
    ) -> Result<Vec<StatusResult>, PbsError> {
        self.status(StatusTarget::Job, id, filter, extend)
    }

    /// Get the status of compute nodes.
    pub fn status_nodes(
        &self,
        id: Option<&str>,
        filter: &[AttributeRequest],
        extend: Option<&str>,
    ) -> Result<Vec<StatusResult>, PbsError> {
        self.status(StatusTarget::Node, id, filter, extend)
    }

    /// Get the status of queues.
    pub fn status_queues(
        &self,
        id: Option<&str>,
        filter: &[AttributeRequest],
        extend: Option<&str>,
    ) -> Result<Vec<StatusResult>, PbsError> {
        self.status(StatusTarget::Queue, id, filter, extend)
    }

    /// Get the status of the server itself. The result has at most one
    /// entry.
    pub fn status_server(
        &self,
        filter: &[AttributeRequest],
        extend: Option<&str>,
    ) -> Result<Vec<StatusResult>, PbsError> {
        self.status(StatusTarget::Server, None, filter, extend)
    }

    fn status(
        &self,
        target: StatusTarget,
        id: Option<&str>,
        filter: &[AttributeRequest],
        extend: Option<&str>,
    ) -> Result<Vec<StatusResult>, PbsError> {
        let chain = codec::encode_attribute_chain::<attrl>(filter)?;
        let c_id = codec::to_opt_cstring("object id", id)?;
        let c_extend = codec::to_opt_cstring("extend", extend)?;

        // Held until the response has been released.
        let _guard = native_lock();

        let raw = unsafe { self.stat_raw(target, codec::opt_ptr(&c_id), chain.head(), codec::opt_ptr(&c_extend)) };
        let code = unsafe { self.native.last_error() };

        // Some servers return data and set the register; whatever came back
        // is owned, and so released, before we look at the code.
        let response = unsafe { StatusChain::from_raw(&self.native, raw) };

        if code != 0 {
            return Err(PbsError::query(code));
        }

        let results = match response {
            Some(response) => response.decode()?,
            None => Vec::new(),
        };

        debug!(
            "{:?} status for {} ({} filters): {} results: {}",
            target,
            id.unwrap_or("all"),
            chain.len(),
            results.len(),
            results.iter().map(|r| &r.name).join(" ")
        );
        Ok(results)
    }

    unsafe fn stat_raw(
        &self,
        target: StatusTarget,
        id: *mut ::libc::c_char,
        attribs: *mut attrl,
        extend: *mut ::libc::c_char,
    ) -> *mut batch_status {
        match target {
            StatusTarget::Job => self.native.stat_job(self.handle, id, attribs, extend),
            StatusTarget::Node => self.native.stat_node(self.handle, id, attribs, extend),
            StatusTarget::Queue => self.native.stat_queue(self.handle, id, attribs, extend),
            StatusTarget::Server => self.native.stat_server(self.handle, attribs, extend),
        }
    }
}

impl<N: Native> Drop for Connection<N> {
    fn drop(&mut self) {
        self.close();
    }
}
