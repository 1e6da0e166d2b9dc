// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Conversion between our data types and the C library's linked records.

Requests go out as singly-linked `attrl`/`attropl` chains whose storage we
own for the duration of the call. Status responses come back as a
`batch_status` chain, each node holding its own `attrl` chain, that the
library allocated and that must be handed back to it exactly once. The
`StatusChain` type owns such a response and releases it on drop; decoding
consumes it, so nothing decoded can outlive or alias the native memory.

*/

use itertools::Itertools;
use libc::c_char;
use std::ffi::{CStr, CString};
use std::ptr;
use torque_sys::{attrl, attropl, batch_op, batch_status};

use error::PbsError;
use model::{Attribute, AttributeRequest, BatchOp, StatusResult};
use native::Native;


/// Traversal of any native chain gives up after this many nodes, on the
/// assumption that the response is corrupt or cyclic.
pub const MAX_CHAIN_LENGTH: usize = 1 << 20;


/// A native record type that is linked through a `next` pointer.
pub trait ChainNode {
    fn next_node(&self) -> *mut Self;
}

impl ChainNode for attrl {
    fn next_node(&self) -> *mut attrl {
        self.next
    }
}

impl ChainNode for attropl {
    fn next_node(&self) -> *mut attropl {
        self.next
    }
}

impl ChainNode for batch_status {
    fn next_node(&self) -> *mut batch_status {
        self.next
    }
}


/// A native attribute record that we know how to fill in: `attrl` for status
/// filters and `attropl` for submissions. The two have the same layout.
pub trait RawAttribute: ChainNode + Sized {
    fn from_parts(name: *mut c_char, resource: *mut c_char, value: *mut c_char, op: batch_op) -> Self;

    /// Set `(*node).next` without creating a reference to the node.
    unsafe fn link(node: *mut Self, next: *mut Self);
}

impl RawAttribute for attrl {
    fn from_parts(name: *mut c_char, resource: *mut c_char, value: *mut c_char, op: batch_op) -> Self {
        attrl { next: ptr::null_mut(), name, resource, value, op }
    }

    unsafe fn link(node: *mut attrl, next: *mut attrl) {
        (*node).next = next;
    }
}

impl RawAttribute for attropl {
    fn from_parts(name: *mut c_char, resource: *mut c_char, value: *mut c_char, op: batch_op) -> Self {
        attropl { next: ptr::null_mut(), name, resource, value, op }
    }

    unsafe fn link(node: *mut attropl, next: *mut attropl) {
        (*node).next = next;
    }
}


/// Convert a caller string to a C string, naming the argument on failure.
pub fn to_cstring(what: &'static str, s: &str) -> Result<CString, PbsError> {
    CString::new(s).map_err(|_| PbsError::InvalidString { what })
}

/// Like `to_cstring`, but `None` stays `None` so that it can become a null
/// pointer.
pub fn to_opt_cstring(what: &'static str, s: Option<&str>) -> Result<Option<CString>, PbsError> {
    match s {
        Some(s) => Ok(Some(to_cstring(what, s)?)),
        None => Ok(None),
    }
}

/// Get a pointer suitable for an optional `char *` argument.
///
/// The C API is not const-correct, but none of the calls we make modify
/// their string arguments.
pub fn opt_ptr(s: &Option<CString>) -> *mut c_char {
    match *s {
        Some(ref c) => c.as_ptr() as *mut c_char,
        None => ptr::null_mut(),
    }
}

/// Copy a C string, treating null as empty.
unsafe fn string_from_c(p: *const c_char) -> String {
    if p.is_null() {
        String::new()
    } else {
        CStr::from_ptr(p).to_string_lossy().into_owned()
    }
}


/// An encoded chain of attribute records, owning all of the memory that the
/// records point to.
///
/// The records are stored contiguously and linked head to tail in the order
/// the requests were given, so the server sees them in caller order. The
/// chain must outlive any native call that is given its `head`; the library
/// does not retain it after returning.
///
/// The record slice and the strings are held as raw allocations from the
/// moment their addresses are taken until `Drop`, so no move or reborrow
/// can invalidate a pointer stored in the chain.
#[derive(Debug)]
pub struct AttributeChain<T> {
    head: *mut T,
    len: usize,
    strings: Vec<*mut c_char>,
}

/// Encode attribute requests as a native chain.
///
/// Every record gets the `SET` operator. Empty fields are sent as empty
/// strings, never as null pointers.
pub fn encode_attribute_chain<T: RawAttribute>(requests: &[AttributeRequest]) -> Result<AttributeChain<T>, PbsError> {
    // Convert everything first, so that failing part way leaves nothing raw
    // to clean up.
    let mut owned = Vec::with_capacity(3 * requests.len());

    for req in requests {
        owned.push(to_cstring("attribute name", &req.name)?);
        owned.push(to_cstring("attribute resource", &req.resource)?);
        owned.push(to_cstring("attribute value", &req.value)?);
    }

    let strings: Vec<*mut c_char> = owned.into_iter().map(CString::into_raw).collect();

    let nodes: Vec<T> = strings
        .chunks(3)
        .map(|s| T::from_parts(s[0], s[1], s[2], BatchOp::Set.to_raw()))
        .collect();

    let len = nodes.len();
    let head = if len == 0 {
        ptr::null_mut()
    } else {
        Box::into_raw(nodes.into_boxed_slice()) as *mut T
    };

    for i in 1..len {
        unsafe { T::link(head.add(i - 1), head.add(i)) };
    }

    trace!(
        "encoded {} attribute records: {}",
        len,
        requests.iter().map(|r| &r.name).join(", ")
    );

    Ok(AttributeChain { head, len, strings })
}

impl<T: RawAttribute> AttributeChain<T> {
    /// The first record, or null if there are no records.
    pub fn head(&self) -> *mut T {
        self.head
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Drop for AttributeChain<T> {
    fn drop(&mut self) {
        if !self.head.is_null() {
            unsafe { drop(Box::from_raw(ptr::slice_from_raw_parts_mut(self.head, self.len))) };
        }

        for &s in &self.strings {
            unsafe { drop(CString::from_raw(s)) };
        }
    }
}


/// Walk a native chain from `head`, decoding each node.
///
/// Stops at a null `next`. A null `head` is an empty chain.
pub unsafe fn traverse<T, U, F>(head: *mut T, decode: F) -> Result<Vec<U>, PbsError>
    where T: ChainNode, F: FnMut(&T) -> Result<U, PbsError>
{
    traverse_bounded(head, MAX_CHAIN_LENGTH, decode)
}

unsafe fn traverse_bounded<T, U, F>(head: *mut T, limit: usize, mut decode: F) -> Result<Vec<U>, PbsError>
    where T: ChainNode, F: FnMut(&T) -> Result<U, PbsError>
{
    let mut items = Vec::new();
    let mut cur = head;

    while !cur.is_null() {
        if items.len() >= limit {
            return Err(PbsError::MalformedChain { limit });
        }

        let node = &*cur;
        items.push(decode(node)?);
        cur = node.next_node();
    }

    Ok(items)
}

unsafe fn decode_attribute(a: &attrl) -> Result<Attribute, PbsError> {
    Ok(Attribute {
        name: string_from_c(a.name),
        resource: string_from_c(a.resource),
        value: string_from_c(a.value),
    })
}

unsafe fn decode_status(st: &batch_status, limit: usize) -> Result<StatusResult, PbsError> {
    Ok(StatusResult {
        name: string_from_c(st.name),
        attributes: traverse_bounded(st.attribs, limit, |a| decode_attribute(a))?,
        text: string_from_c(st.text),
    })
}


/// A status response allocated by the native library.
///
/// The whole chain, nested attribute chains included, is released through
/// `Native::free_status` when this value is dropped. Being an owned value
/// without `Clone`, it can only be released once.
pub struct StatusChain<'a, N: 'a + Native> {
    head: *mut batch_status,
    native: &'a N,
}

impl<'a, N: Native> StatusChain<'a, N> {
    /// Take ownership of a response. Returns `None` for a null pointer, which
    /// needs no release.
    ///
    /// # Safety
    ///
    /// `head` must be null or a chain returned by one of `native`'s `stat_*`
    /// methods that has not been released.
    pub unsafe fn from_raw(native: &'a N, head: *mut batch_status) -> Option<Self> {
        if head.is_null() {
            None
        } else {
            Some(StatusChain { head, native })
        }
    }

    /// Copy the response into owned values, then release it.
    pub fn decode(self) -> Result<Vec<StatusResult>, PbsError> {
        self.decode_bounded(MAX_CHAIN_LENGTH)
    }

    fn decode_bounded(self, limit: usize) -> Result<Vec<StatusResult>, PbsError> {
        unsafe { traverse_bounded(self.head, limit, |st| decode_status(st, limit)) }
    }
}

impl<'a, N: Native> Drop for StatusChain<'a, N> {
    fn drop(&mut self) {
        trace!("releasing status chain at {:p}", self.head);
        unsafe { self.native.free_status(self.head) };
    }
}


/// Decode and release a status response in one step.
///
/// A null `head` yields an empty list and is not released.
///
/// # Safety
///
/// As for `StatusChain::from_raw`.
pub unsafe fn decode_status_chain<N: Native>(native: &N, head: *mut batch_status) -> Result<Vec<StatusResult>, PbsError> {
    match StatusChain::from_raw(native, head) {
        Some(chain) => chain.decode(),
        None => Ok(Vec::new()),
    }
}


/// A heap string handed to us by the native library, released on drop.
pub struct NativeString<'a, N: 'a + Native> {
    ptr: *mut c_char,
    native: &'a N,
}

impl<'a, N: Native> NativeString<'a, N> {
    /// # Safety
    ///
    /// `ptr` must be null or a string that `native.free_string` may release.
    pub unsafe fn from_raw(native: &'a N, ptr: *mut c_char) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(NativeString { ptr, native })
        }
    }

    pub fn to_string_lossy(&self) -> String {
        unsafe { string_from_c(self.ptr) }
    }
}

impl<'a, N: Native> Drop for NativeString<'a, N> {
    fn drop(&mut self) {
        trace!("releasing native string at {:p}", self.ptr);
        unsafe { self.native.free_string(self.ptr) };
    }
}
