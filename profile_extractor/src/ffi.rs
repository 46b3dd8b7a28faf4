//! FFI interface for C/C++ hosts
//!
//! Field sets go in and extraction results come out as JSON, so the C side
//! never sees Rust types.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::document::HtmlDocument;
use crate::extractor::Extractor;
use crate::field::FieldSet;
use crate::profile::guest_profile;

/// Result struct returned to C
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized ExtractionResult (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Extract a record from HTML.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `fields_json` - JSON field set (array of fields, or `{"fields": [...]}`),
///   null-terminated; null selects the built-in guest profile
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `fields_json` must be null or a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    fields_json: *const c_char,
) -> ExtractionResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };

    let fields = if fields_json.is_null() {
        guest_profile()
    } else {
        match CStr::from_ptr(fields_json).to_str() {
            Ok(s) => FieldSet::from_json(s),
            Err(_) => return make_error_result("Invalid UTF-8 in fields JSON"),
        }
    };
    let fields = match fields {
        Ok(f) => f,
        Err(e) => return make_error_result(&format!("Invalid field set: {}", e)),
    };

    let document = HtmlDocument::parse(html);
    let result = Extractor::new(fields).extract(&document);

    match serde_json::to_string(&result) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free an ExtractionResultFFI returned by extract_from_html
///
/// # Safety
/// - `result` must have been returned by `extract_from_html`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

/// `error_ptr` is never null here; interior NULs are dropped from the message
fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error = CString::new(msg.replace('\0', "")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error.into_raw(),
    }
}
