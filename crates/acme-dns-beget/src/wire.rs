//! Wire format of the provider API
//!
//! Every call is a request carrying `login`, `passwd`, `input_format=json`
//! and `output_format=json` as query parameters, and a single form field
//! `input_data` holding the JSON-encoded parameters of the operation.
//!
//! Every answer is wrapped twice:
//!
//! ```json
//! {"status":"success","answer":{"status":"success","result":...}}
//! ```

use acme_dns_core::{ApiErrorDetail, Records};
use serde::{Deserialize, Deserializer, Serialize};

/// Path of the fetch-records operation
pub const GET_DATA_PATH: &str = "/api/dns/getData";

/// Path of the replace-records operation
pub const CHANGE_RECORDS_PATH: &str = "/api/dns/changeRecords";

/// Form field carrying the JSON-encoded parameters
pub const INPUT_DATA_FIELD: &str = "input_data";

/// Query parameter declaring how `input_data` is encoded
pub const INPUT_FORMAT_PARAM: &str = "input_format";

/// Query parameter declaring how the answer should be encoded
pub const OUTPUT_FORMAT_PARAM: &str = "output_format";

/// Query parameter carrying the API login
pub const LOGIN_PARAM: &str = "login";

/// Query parameter carrying the API password
pub const PASSWD_PARAM: &str = "passwd";

/// The only format this client speaks
pub const FORMAT_JSON: &str = "json";

/// Status string of a successful call
pub const STATUS_SUCCESS: &str = "success";

/// Status string of a failed call
pub const STATUS_ERROR: &str = "error";

fn null_as_empty<'de, D>(deserializer: D) -> Result<Records, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Records>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `input_data` of `getData`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Domain to read
    #[serde(default)]
    pub fqdn: String,
}

/// `input_data` of `changeRecords`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceRequest {
    /// Domain to write
    #[serde(default)]
    pub fqdn: String,
    /// Full replacement record set
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Records,
}

/// Outer envelope shared by every answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope<A> {
    /// Transport-level status
    #[serde(default)]
    pub status: String,
    /// Operation-level answer
    pub answer: A,
}

impl<A> Envelope<A> {
    /// Wrap a successful answer
    pub fn success(answer: A) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            answer,
        }
    }
}

/// `result` of `getData`; the real provider sends more fields than these
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Domain the records belong to
    #[serde(default)]
    pub fqdn: String,
    /// Stored records
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Records,
}

/// `answer` of `getData`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchAnswer {
    /// Operation status
    #[serde(default)]
    pub status: String,
    /// Operation result
    pub result: FetchResult,
}

/// `answer` of `changeRecords`
///
/// An error answer carries `errors` and no `result`, which reads as `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceAnswer {
    /// Operation status
    #[serde(default)]
    pub status: String,
    /// Whether the records were replaced
    #[serde(default)]
    pub result: bool,
    /// Provider-reported errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,
}

/// `answer` of a failed call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnswer {
    /// Operation status
    #[serde(default)]
    pub status: String,
    /// Provider-reported errors
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// Full answer of `getData`
pub type FetchResponse = Envelope<FetchAnswer>;

/// Full answer of `changeRecords`
pub type ReplaceResponse = Envelope<ReplaceAnswer>;

/// Full answer of a failed call
pub type ErrorResponse = Envelope<ErrorAnswer>;

impl ErrorResponse {
    /// Build an error envelope with a single error entry
    pub fn single(
        status: impl Into<String>,
        answer_status: impl Into<String>,
        error_code: impl Into<String>,
        error_text: serde_json::Value,
    ) -> Self {
        Self {
            status: status.into(),
            answer: ErrorAnswer {
                status: answer_status.into(),
                errors: vec![ApiErrorDetail {
                    error_code: error_code.into(),
                    error_text,
                }],
            },
        }
    }
}
