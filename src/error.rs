// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Error codes reported by the PBS server and the errors we raise for them.

The native library reports failures through a single `pbs_errno` register.
Codes at or above `PBSE_FLOOR` (15000) are request rejections from the
server; we carry a text table for those we know about.

*/

/// The text used for any code that has no entry in the table.
pub const FALLBACK_DESCRIPTION: &str = "no text available for this error";

/// Server rejection codes and their text, sorted by code.
///
/// 15001 (unknown job id) has no entry and resolves to the fallback text.
static ERROR_TEXT: &[(i32, &str)] = &[
    (15002, "Undefined attribute"),
    (15003, "Attempt to set READ ONLY attribute"),
    (15004, "Invalid request"),
    (15005, "Unknown batch request"),
    (15006, "Too many submit retries"),
    (15007, "No permission"),
    (15008, "Access from host not allowed"),
    (15009, "Job already exists"),
    (15010, "System error occurred"),
    (15011, "Internal server error occurred"),
    (15012, "Parent job of dependent in route queue"),
    (15013, "Unknown signal name"),
    (15014, "Bad attribute value"),
    (15015, "Cannot modify attribute in run state"),
    (15016, "Request invalid for job state"),
    (15018, "Unknown queue name"),
    (15019, "Invalid credential in request"),
    (15020, "Expired credential in request"),
    (15021, "Queue not enabled"),
    (15022, "No access permission for queue"),
    (15023, "Bad user - no password entry"),
    (15024, "Max hop count exceeded"),
    (15025, "Queue already exists"),
    (15026, "Incompatible queue attribute type"),
    (15027, "Queue busy (not empty)"),
    (15028, "Queue name too long"),
    (15029, "Feature/function not supported"),
    (15030, "Cannot enable queue, lacking definition"),
    (15031, "Protocol (ASN.1) error"),
    (15032, "Bad attribute list structure"),
    (15033, "No free connections"),
    (15034, "No server to connect to"),
    (15035, "Unknown resource"),
    (15036, "Job exceeds queue resource limits"),
    (15037, "No default queue defined"),
    (15038, "Job not rerunnable"),
    (15039, "Route rejected by all destinations"),
    (15040, "Time in route queue expired"),
    (15041, "Request to MOM failed"),
    (15042, "Cannot access script file"),
    (15043, "Stage in of files failed"),
    (15044, "Resources temporarily unavailable"),
    (15045, "Bad group specified"),
    (15046, "Maximum number of jobs already in queue"),
    (15047, "Checkpoint busy, may be retried"),
    (15048, "Limit exceeds allowable"),
    (15049, "Bad account attribute value"),
    (15050, "Job already in exit state"),
    (15051, "Job files not copied"),
    (15052, "Unknown job id after clean init"),
    (15053, "No master in sync set"),
    (15054, "Invalid dependency"),
    (15055, "Duplicate entry in list"),
    (15056, "Bad DIS based request protocol"),
    (15057, "Cannot execute there"),
    (15058, "Sister rejected"),
    (15059, "Sister could not communicate"),
    (15060, "Request rejected - server shutting down"),
    (15061, "Not all tasks could checkpoint"),
    (15062, "Named node is not in the list"),
    (15063, "Node attribute not recognized"),
    (15064, "Server has no node list"),
    (15065, "Node name is too big"),
    (15066, "Node name already exists"),
    (15067, "Bad node attribute value"),
    (15068, "State values are mutually exclusive"),
    (15069, "Error(s) during global modification of nodes"),
    (15070, "Could not contact MOM"),
];


/// Get the human-readable text for an error code.
///
/// Never fails: unknown codes get `FALLBACK_DESCRIPTION`.
pub fn describe(code: i32) -> &'static str {
    match ERROR_TEXT.binary_search_by_key(&code, |&(c, _)| c) {
        Ok(idx) => ERROR_TEXT[idx].1,
        Err(_) => FALLBACK_DESCRIPTION,
    }
}


/// An error arising from an interaction with the PBS server.
///
/// The first four variants correspond to a non-zero error register after a
/// native call and carry the code along with its text from `describe`.
#[derive(Clone, Debug, Eq, Fail, PartialEq)]
pub enum PbsError {
    /// Establishing a session with the server failed.
    #[fail(display = "failed to connect to PBS server: {} (error {})", description, code)]
    Connection { code: i32, description: String },

    /// The server rejected a job submission.
    #[fail(display = "failed to submit job: {} (error {})", description, code)]
    Submission { code: i32, description: String },

    /// The server rejected a job deletion.
    #[fail(display = "failed to delete job: {} (error {})", description, code)]
    Deletion { code: i32, description: String },

    /// A job, node, queue, or server status query failed.
    #[fail(display = "status query failed: {} (error {})", description, code)]
    Query { code: i32, description: String },

    /// A string argument could not be passed to C because it contains a NUL.
    #[fail(display = "{} contains an interior NUL byte", what)]
    InvalidString { what: &'static str },

    /// A status response chain did not terminate within the traversal limit.
    #[fail(display = "status response exceeds {} entries; assuming it is corrupt", limit)]
    MalformedChain { limit: usize },
}

impl PbsError {
    pub(crate) fn connection(code: i32) -> Self {
        PbsError::Connection { code, description: describe(code).to_owned() }
    }

    pub(crate) fn submission(code: i32) -> Self {
        PbsError::Submission { code, description: describe(code).to_owned() }
    }

    pub(crate) fn deletion(code: i32) -> Self {
        PbsError::Deletion { code, description: describe(code).to_owned() }
    }

    pub(crate) fn query(code: i32) -> Self {
        PbsError::Query { code, description: describe(code).to_owned() }
    }

    /// The native error code, if this error came from the error register.
    pub fn code(&self) -> Option<i32> {
        match *self {
            PbsError::Connection { code, .. } |
            PbsError::Submission { code, .. } |
            PbsError::Deletion { code, .. } |
            PbsError::Query { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The registry text for the native error code, if there is one.
    pub fn description(&self) -> Option<&str> {
        match *self {
            PbsError::Connection { ref description, .. } |
            PbsError::Submission { ref description, .. } |
            PbsError::Deletion { ref description, .. } |
            PbsError::Query { ref description, .. } => Some(description.as_str()),
            _ => None,
        }
    }
}
