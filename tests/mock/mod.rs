// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

//! A stand-in for `libtorque` that lives entirely on the Rust heap.
//!
//! Responses are built from `MockObject`s with `Box`/`CString` allocations
//! and torn down again in `free_status`, so any double release or leak shows
//! up in the counters.

#![allow(dead_code)]

use libc::{c_char, c_int};
use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::ptr;
use std::rc::Rc;
use torque::Native;
use torque_sys::{attrl, attropl, batch_op, batch_status};


#[derive(Clone, Debug, Default)]
pub struct MockObject {
    pub name: String,
    pub attribs: Vec<(String, Option<String>, String)>,
    pub text: Option<String>,
}

impl MockObject {
    pub fn new(name: &str) -> Self {
        MockObject { name: name.to_owned(), ..MockObject::default() }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attribs.push((name.to_owned(), None, value.to_owned()));
        self
    }

    pub fn resource(mut self, name: &str, resource: &str, value: &str) -> Self {
        self.attribs.push((name.to_owned(), Some(resource.to_owned()), value.to_owned()));
        self
    }
}


/// A record of one attribute node that was passed to us.
pub type SeenAttribute = (String, String, String, batch_op);


#[derive(Debug, Default)]
pub struct MockState {
    /// What `last_error` reports after every call.
    pub errno: c_int,

    /// Returned by `connect`.
    pub connect_handle: c_int,

    /// Returned by `disconnect` and `delete_job`.
    pub rc: c_int,

    pub default_server: Option<CString>,

    /// Returned by `submit`; `None` gives a null pointer.
    pub job_id: Option<String>,

    /// Objects returned by every `stat_*` call.
    pub objects: Vec<MockObject>,

    /// Return a null pointer from `stat_*` even when `objects` is non-empty.
    pub null_status: bool,

    /// Instead of `objects`, answer `stat_*` with one object per call whose
    /// attributes are a copy of the filter chain.
    pub reflect_filter: bool,

    pub calls: Vec<String>,
    pub servers: Vec<Option<String>>,
    pub disconnects: Vec<c_int>,
    pub submitted: Vec<SeenAttribute>,
    pub filters: Vec<SeenAttribute>,
    pub ids: Vec<Option<String>>,
    pub extends: Vec<Option<String>>,
    pub scripts: Vec<(String, String)>,

    /// Addresses of chains we handed out and have not had back.
    pub live_chains: HashSet<usize>,
    pub status_frees: Vec<usize>,
    pub bad_frees: usize,

    pub live_strings: HashSet<usize>,
    pub string_frees: usize,
}


#[derive(Clone, Debug, Default)]
pub struct MockTorque {
    pub state: Rc<RefCell<MockState>>,
}

impl MockTorque {
    pub fn new() -> Self {
        let m = MockTorque::default();
        m.state.borrow_mut().connect_handle = 3;
        m
    }

    pub fn set_errno(&self, errno: c_int) {
        self.state.borrow_mut().errno = errno;
    }

    pub fn state(&self) -> ::std::cell::Ref<MockState> {
        self.state.borrow()
    }

    fn record(&self, call: &str) {
        self.state.borrow_mut().calls.push(call.to_owned());
    }
}


unsafe fn opt_string(p: *const c_char) -> Option<String> {
    if p.is_null() {
        None
    } else {
        Some(CStr::from_ptr(p).to_string_lossy().into_owned())
    }
}

fn alloc_string(s: Option<&str>) -> *mut c_char {
    match s {
        Some(s) => CString::new(s).unwrap().into_raw(),
        None => ptr::null_mut(),
    }
}

unsafe fn release_string(p: *mut c_char) {
    if !p.is_null() {
        drop(CString::from_raw(p));
    }
}

unsafe fn read_attrl(mut p: *mut attrl) -> Vec<SeenAttribute> {
    let mut seen = Vec::new();

    while !p.is_null() {
        let a = &*p;
        seen.push((
            opt_string(a.name).expect("null attribute name"),
            opt_string(a.resource).expect("null attribute resource"),
            opt_string(a.value).expect("null attribute value"),
            a.op,
        ));
        p = a.next;
    }

    seen
}

unsafe fn read_attropl(mut p: *mut attropl) -> Vec<SeenAttribute> {
    let mut seen = Vec::new();

    while !p.is_null() {
        let a = &*p;
        seen.push((
            opt_string(a.name).expect("null attribute name"),
            opt_string(a.resource).expect("null attribute resource"),
            opt_string(a.value).expect("null attribute value"),
            a.op,
        ));
        p = a.next;
    }

    seen
}

fn build_chain(objects: &[MockObject]) -> *mut batch_status {
    let mut next = ptr::null_mut();

    for obj in objects.iter().rev() {
        let mut attr_next = ptr::null_mut();

        for &(ref name, ref resource, ref value) in obj.attribs.iter().rev() {
            attr_next = Box::into_raw(Box::new(attrl {
                next: attr_next,
                name: alloc_string(Some(name)),
                resource: alloc_string(resource.as_ref().map(|s| s.as_str())),
                value: alloc_string(Some(value)),
                op: 0,
            }));
        }

        next = Box::into_raw(Box::new(batch_status {
            next,
            name: alloc_string(Some(&obj.name)),
            attribs: attr_next,
            text: alloc_string(obj.text.as_ref().map(|s| s.as_str())),
        }));
    }

    next
}

unsafe fn release_chain(mut p: *mut batch_status) {
    while !p.is_null() {
        let st = Box::from_raw(p);
        let mut a = st.attribs;

        while !a.is_null() {
            let attr = Box::from_raw(a);
            release_string(attr.name);
            release_string(attr.resource);
            release_string(attr.value);
            a = attr.next;
        }

        release_string(st.name);
        release_string(st.text);
        p = st.next;
    }
}

impl MockTorque {
    unsafe fn stat(&self, call: &str, id: *mut c_char, attribs: *mut attrl, extend: *mut c_char) -> *mut batch_status {
        self.record(call);
        let filter = read_attrl(attribs);

        let mut st = self.state.borrow_mut();
        st.ids.push(opt_string(id));
        st.extends.push(opt_string(extend));
        st.filters.extend(filter.iter().cloned());

        if st.null_status {
            return ptr::null_mut();
        }

        let objects = if st.reflect_filter {
            let mut obj = MockObject::new("reflected");
            for (name, resource, value, _) in filter {
                let resource = if resource.is_empty() { None } else { Some(resource) };
                obj.attribs.push((name, resource, value));
            }
            vec![obj]
        } else {
            st.objects.clone()
        };

        let chain = build_chain(&objects);

        if !chain.is_null() {
            st.live_chains.insert(chain as usize);
        }

        chain
    }
}

impl Native for MockTorque {
    unsafe fn connect(&self, server: *mut c_char) -> c_int {
        self.record("connect");
        let mut st = self.state.borrow_mut();
        st.servers.push(opt_string(server));
        st.connect_handle
    }

    unsafe fn default_server(&self) -> *mut c_char {
        self.record("default_server");
        match self.state.borrow().default_server {
            Some(ref s) => s.as_ptr() as *mut c_char,
            None => ptr::null_mut(),
        }
    }

    unsafe fn disconnect(&self, connection: c_int) -> c_int {
        self.record("disconnect");
        let mut st = self.state.borrow_mut();
        st.disconnects.push(connection);
        st.rc
    }

    unsafe fn delete_job(&self, _connection: c_int, job_id: *mut c_char, extend: *mut c_char) -> c_int {
        self.record("delete_job");
        let mut st = self.state.borrow_mut();
        st.ids.push(opt_string(job_id));
        st.extends.push(opt_string(extend));
        st.rc
    }

    unsafe fn submit(
        &self,
        _connection: c_int,
        attribs: *mut attropl,
        script: *mut c_char,
        destination: *mut c_char,
        extend: *mut c_char,
    ) -> *mut c_char {
        self.record("submit");
        let seen = read_attropl(attribs);

        let mut st = self.state.borrow_mut();
        st.submitted.extend(seen);
        st.scripts.push((opt_string(script).unwrap(), opt_string(destination).unwrap()));
        st.extends.push(opt_string(extend));

        let p = alloc_string(st.job_id.as_ref().map(|s| s.as_str()));

        if !p.is_null() {
            st.live_strings.insert(p as usize);
        }

        p
    }

    unsafe fn stat_job(&self, _c: c_int, id: *mut c_char, attribs: *mut attrl, extend: *mut c_char) -> *mut batch_status {
        self.stat("stat_job", id, attribs, extend)
    }

    unsafe fn stat_node(&self, _c: c_int, id: *mut c_char, attribs: *mut attrl, extend: *mut c_char) -> *mut batch_status {
        self.stat("stat_node", id, attribs, extend)
    }

    unsafe fn stat_queue(&self, _c: c_int, id: *mut c_char, attribs: *mut attrl, extend: *mut c_char) -> *mut batch_status {
        self.stat("stat_queue", id, attribs, extend)
    }

    unsafe fn stat_server(&self, _c: c_int, attribs: *mut attrl, extend: *mut c_char) -> *mut batch_status {
        self.stat("stat_server", ptr::null_mut(), attribs, extend)
    }

    unsafe fn free_status(&self, status: *mut batch_status) {
        self.record("free_status");
        let known = {
            let mut st = self.state.borrow_mut();
            st.status_frees.push(status as usize);
            st.live_chains.remove(&(status as usize))
        };

        if known {
            release_chain(status);
        } else {
            self.state.borrow_mut().bad_frees += 1;
        }
    }

    unsafe fn free_string(&self, s: *mut c_char) {
        self.record("free_string");
        let known = {
            let mut st = self.state.borrow_mut();
            st.string_frees += 1;
            st.live_strings.remove(&(s as usize))
        };

        if known {
            release_string(s);
        } else {
            self.state.borrow_mut().bad_frees += 1;
        }
    }

    unsafe fn last_error(&self) -> c_int {
        self.state.borrow().errno
    }
}
