// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Plain data exchanged with the server: attribute requests and status results.

*/

use torque_sys;


/// An attribute operator, as carried in the native attribute records.
///
/// Submissions always use `Set`. On decoded status attributes the operator
/// has no meaning, so we do not surface it there.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BatchOp {
    Set,
    Unset,
    Incr,
    Decr,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    Default,
    Merge,
}

impl BatchOp {
    /// Convert to the numeric value used by the C library.
    pub fn to_raw(self) -> torque_sys::batch_op {
        match self {
            BatchOp::Set => torque_sys::batch_op_SET,
            BatchOp::Unset => torque_sys::batch_op_UNSET,
            BatchOp::Incr => torque_sys::batch_op_INCR,
            BatchOp::Decr => torque_sys::batch_op_DECR,
            BatchOp::Eq => torque_sys::batch_op_EQ,
            BatchOp::Ne => torque_sys::batch_op_NE,
            BatchOp::Ge => torque_sys::batch_op_GE,
            BatchOp::Gt => torque_sys::batch_op_GT,
            BatchOp::Le => torque_sys::batch_op_LE,
            BatchOp::Lt => torque_sys::batch_op_LT,
            BatchOp::Default => torque_sys::batch_op_DFLT,
            BatchOp::Merge => torque_sys::batch_op_MERGE,
        }
    }

    /// Convert from the numeric value used by the C library.
    pub fn from_raw(raw: torque_sys::batch_op) -> Option<BatchOp> {
        Some(match raw {
            torque_sys::batch_op_SET => BatchOp::Set,
            torque_sys::batch_op_UNSET => BatchOp::Unset,
            torque_sys::batch_op_INCR => BatchOp::Incr,
            torque_sys::batch_op_DECR => BatchOp::Decr,
            torque_sys::batch_op_EQ => BatchOp::Eq,
            torque_sys::batch_op_NE => BatchOp::Ne,
            torque_sys::batch_op_GE => BatchOp::Ge,
            torque_sys::batch_op_GT => BatchOp::Gt,
            torque_sys::batch_op_LE => BatchOp::Le,
            torque_sys::batch_op_LT => BatchOp::Lt,
            torque_sys::batch_op_DFLT => BatchOp::Default,
            torque_sys::batch_op_MERGE => BatchOp::Merge,
            _ => return None,
        })
    }
}

impl Default for BatchOp {
    fn default() -> Self {
        BatchOp::Set
    }
}


/// One attribute to send to the server, either as part of a job submission
/// or as a status query filter.
///
/// Sequences of these are sent in the order given.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttributeRequest {
    pub name: String,

    /// Empty unless the attribute is resource-qualified, like
    /// `Resource_List.walltime`.
    pub resource: String,

    pub value: String,

    /// The encoder always sends `BatchOp::Set`; this records what the
    /// caller intended.
    pub op: BatchOp,
}

impl AttributeRequest {
    /// A plain attribute, e.g. `Job_Name`.
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        AttributeRequest {
            name: name.into(),
            value: value.into(),
            ..AttributeRequest::default()
        }
    }

    /// A resource-qualified attribute, e.g. `Resource_List` / `walltime`.
    pub fn resource<N, R, V>(name: N, resource: R, value: V) -> Self
        where N: Into<String>, R: Into<String>, V: Into<String>
    {
        AttributeRequest {
            name: name.into(),
            resource: resource.into(),
            value: value.into(),
            op: BatchOp::Set,
        }
    }

    /// A bare attribute name, as used in status filters to select which
    /// attributes the server should report.
    pub fn name_only<N: Into<String>>(name: N) -> Self {
        AttributeRequest::new(name, "")
    }
}


/// An attribute as reported in a status response.
///
/// Null strings in the response become empty strings here.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub resource: String,
    pub value: String,
}

impl Attribute {
    pub fn new<N, R, V>(name: N, resource: R, value: V) -> Self
        where N: Into<String>, R: Into<String>, V: Into<String>
    {
        Attribute { name: name.into(), resource: resource.into(), value: value.into() }
    }
}


/// The status of one job, node, queue, or server.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusResult {
    /// The object's identifier: a job id, node name, queue name, or server
    /// name.
    pub name: String,

    /// Attributes in the order the server sent them.
    pub attributes: Vec<Attribute>,

    /// Free-form diagnostic text; usually empty.
    pub text: String,
}

impl StatusResult {
    /// Get the value of the first attribute with this name and no resource.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.resource.is_empty())
            .map(|a| a.value.as_str())
    }

    /// Get the value of a resource-qualified attribute, like
    /// `resources_used` / `walltime`.
    pub fn resource(&self, name: &str, resource: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.resource == resource)
            .map(|a| a.value.as_str())
    }
}
