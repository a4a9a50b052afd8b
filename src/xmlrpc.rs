// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Minimal XML-RPC codec for `pingback.ping`.
//!
//! This is a tolerant pattern scanner, not an XML parser. It understands
//! exactly the envelopes Pingback peers exchange: a `methodCall` with two
//! positional string parameters, a `methodResponse` carrying one string, and
//! a `methodResponse` fault struct.

use crate::fault::FaultCode;
use lazy_static::lazy_static;
use regex::Regex;

/// Method name of a pingback call.
pub const PING_METHOD: &str = "pingback.ping";

/// Content type used for every envelope this crate writes.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

lazy_static! {
    static ref PARAM: Regex = Regex::new(
        r"(?i)<param>\s*<value>\s*(?:<string>\s*)?(?:<!\[CDATA\[)?([^<>]+?)(?:\]\]>)?(?:\s*</string>)?\s*</value>\s*</param>"
    )
    .unwrap(/* known good */);
    static ref AMP: Regex = Regex::new(r"(?i)&amp;").unwrap(/* known good */);
    static ref FAULT: Regex =
        Regex::new(r"(?i)<int>([^<]+)</int>[\s\S]+?<string>([^<]+)</string>").unwrap(/* known good */);
}

/// Escape the five XML special characters.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`].
pub fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Decode only `&amp;`, the one entity a URI parameter is expected to carry.
pub fn decode_amp(s: &str) -> String {
    AMP.replace_all(s, "&").into_owned()
}

/// Scan `body` for XML-RPC string parameters, in document order.
///
/// Values may be bare, `<string>`-wrapped or `CDATA`-wrapped. `&amp;` is
/// decoded and surrounding whitespace trimmed.
pub fn string_params(body: &str) -> Vec<String> {
    PARAM
        .captures_iter(body)
        .map(|caps| decode_amp(&caps[1]).trim().to_string())
        .collect()
}

/// Build the `pingback.ping` call sent to a target's endpoint.
pub fn method_call(source: &str, target: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<methodCall>
  <methodName>{PING_METHOD}</methodName>
  <params>
    <param><value><string>{source}</string></value></param>
    <param><value><string>{target}</string></value></param>
  </params>
</methodCall>"#,
        source = escape(source),
        target = escape(target),
    )
}

/// Build a fault `methodResponse`.
pub fn fault_response(fault: FaultCode) -> String {
    format!(
        r#"<?xml version="1.0"?>
<methodResponse>
  <fault><value><struct>
    <member>
      <name>faultCode</name>
      <value><int>{code}</int></value>
    </member>
    <member>
      <name>faultString</name>
      <value><string>{message}</string></value>
    </member>
  </struct></value></fault>
</methodResponse>"#,
        code = fault.code(),
        message = fault.message(),
    )
}

/// Build a successful `methodResponse` carrying `message`.
pub fn success_response(message: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<methodResponse>
  <params><param>
    <value><string>{}</string></value>
  </param></params>
</methodResponse>"#,
        escape(message)
    )
}

/// Extract `(faultCode, faultString)` from a response that mentions a fault.
///
/// Returns `None` when the body carries no `<fault>` element. A body that has the
/// marker but no integer code reports `GENERAL_ERROR` with an empty message.
pub fn parse_fault(body: &str) -> Option<(i32, String)> {
    if !body.contains("<fault") {
        return None;
    }
    let parsed = FAULT.captures(body).and_then(|caps| {
        let code = caps[1].trim().parse::<i32>().ok()?;
        Some((code, unescape(&caps[2])))
    });
    Some(parsed.unwrap_or((FaultCode::GeneralError.code(), String::new())))
}
