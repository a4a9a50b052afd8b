// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

#![allow(dead_code)]

use pingback_engine::xmlrpc;

/// Generate a pool of source URLs for testing.
pub fn generate_sources(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("http://source-{}.example.com/post/{}", i / 10, i % 10))
        .collect()
}

/// Generate self-ping pairs (source and target share host).
pub fn generate_self_ping_pairs(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| {
            let host = format!("site-{}.example.com", i);
            (
                format!("http://{}/post/{}", host, i),
                format!("http://{}/article/{}?c={}", host, i, i),
            )
        })
        .collect()
}

/// Generate Content-Type values, each paired with whether it is XML.
pub fn generate_content_types() -> Vec<(Option<&'static str>, bool)> {
    vec![
        (Some("text/xml"), true),
        (Some("application/xml"), true),
        (Some("text/xml; charset=utf-8"), true),
        (Some("TEXT/XML"), true),
        (Some("application/rss+xml"), true),
        (Some("application/json"), false),
        (Some("text/plain"), false),
        (Some("application/x-www-form-urlencoded"), false),
        (Some("text/xml-stylesheet"), false),
        (None, false),
        (Some(""), false),
        (Some("   "), false),
    ]
}

/// XML-RPC calls that are not pingbacks.
pub fn generate_foreign_calls() -> Vec<String> {
    ["weblogUpdates.ping", "system.listMethods", "pingback.extensions.getPingbacks", "metaWeblog.newPost"]
        .iter()
        .map(|method| {
            xmlrpc::method_call("http://a.example/post", "http://b.example/target?1")
                .replace(xmlrpc::PING_METHOD, method)
        })
        .chain([String::from("<methodCall/>"), String::from("garbage")])
        .collect()
}

/// URI strings exercising every escaped character.
pub fn generate_escapable_uris() -> Vec<String> {
    vec![
        "http://a.example/?a=1&b=2".to_string(),
        "http://a.example/<tag>".to_string(),
        r#"http://a.example/"quoted""#.to_string(),
        "http://a.example/it's".to_string(),
        r#"http://a.example/?q=<&>"'&amp;"#.to_string(),
        "http://a.example/plain".to_string(),
    ]
}

/// Filler prose of `words` words.
pub fn generate_words(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" \n ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sources() {
        let sources = generate_sources(100);
        assert_eq!(sources.len(), 100);
        assert!(sources[0].starts_with("http://"));
    }
}
