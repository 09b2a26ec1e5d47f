// whois-query-lib/tests/integration.rs

//! Integration tests for whois-query-lib exports and the end-to-end pipeline

use std::sync::Arc;
use whois_query_lib::{
    parse_date, parse_iana_refer_response, registrable_domain, DateOrString, DomainResolver,
    FieldValue, NativeExecutable, QueryOptions, ResolvedDomain, SuffixSource, SuffixStore,
    WhoisQuery, WhoisQueryError, WhoisTransport,
};

#[test]
fn test_bundled_list_resolves_known_domains() {
    let suffixes = SuffixStore::global().load().unwrap();

    assert_eq!(registrable_domain("www.google.com.au", &suffixes), "google.com.au");
    assert_eq!(registrable_domain("abc.def.com", &suffixes), "def.com");
    assert_eq!(registrable_domain("chambagri.fr", &suffixes), "chambagri.fr");
    assert_eq!(registrable_domain("www.公司.hk", &suffixes), "www.公司.hk");
    assert_eq!(registrable_domain("例子.公司.hk", &suffixes), "例子.公司.hk");
}

#[tokio::test]
async fn test_resolver_over_hostnames() {
    let resolver = DomainResolver::new();

    let domain = resolver
        .resolve("https://www.google.com.au/tos.html")
        .await
        .unwrap();
    assert_eq!(domain, ResolvedDomain::new("google.com.au"));

    let err = resolver.resolve("   ").await.unwrap_err();
    assert!(matches!(err, WhoisQueryError::InvalidDomain { .. }));
}

#[tokio::test]
async fn test_empty_suffix_source_fails_every_resolution() {
    let store = Arc::new(SuffixStore::new(SuffixSource::Text(
        "// nothing but comments\n\n".to_string(),
    )));
    let resolver = DomainResolver::with_store(store);

    for input in ["example.com", "www.google.com.au"] {
        let err = resolver.resolve(input).await.unwrap_err();
        assert!(err.is_fatal());
    }
}

#[tokio::test]
async fn test_pipeline_through_native_executable() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake-whois");
    std::fs::write(
        &script,
        "#!/bin/sh\nprintf 'Domain Name: %s\\nRegistrar: Example Registrar\\nCreation Date: 2000-01-02T03:04:05Z\\n' \"$1\"\n",
    )
    .unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let options = QueryOptions::default()
        .with_native_executable(true)
        .with_executable(script.to_string_lossy())
        .with_raw(true);
    let record = WhoisQuery::new(options)
        .run("http://www.abc.def.com/path")
        .await
        .unwrap();

    assert_eq!(
        record.get("domain_name").and_then(FieldValue::as_text),
        Some("def.com")
    );
    assert_eq!(
        record.get("registrar").and_then(FieldValue::as_text),
        Some("Example Registrar")
    );
    assert!(record
        .get("creation_date")
        .and_then(FieldValue::as_date)
        .is_some());
    assert!(record.raw().unwrap().starts_with("Domain Name: def.com\n"));

    let json: serde_json::Value = serde_json::from_str(&record.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["creation_date"], "2000-01-02T03:04:05Z");
}

#[tokio::test]
async fn test_native_transport_is_usable_directly() {
    let transport = NativeExecutable::with_executable("echo");
    assert_eq!(transport.name(), "native");
    let raw = transport
        .query(&ResolvedDomain::new("google.com.au"))
        .await
        .unwrap();
    assert_eq!(raw, "google.com.au\n");
}

#[test]
fn test_date_and_iana_helpers_are_exported() {
    assert!(matches!(parse_date("2024-05-06"), DateOrString::Date(_)));
    assert_eq!(
        parse_iana_refer_response("refer:        whois.nic.fr\n"),
        Some("whois.nic.fr".to_string())
    );
}

#[tokio::test]
#[ignore]
async fn test_live_socket_lookup() {
    let record = whois_query_lib::whois("https://www.google.com/", QueryOptions::default())
        .await
        .unwrap();
    assert!(record.contains("registrar"));
}

#[tokio::test]
#[ignore]
async fn test_live_reverse_lookup() {
    let domain = DomainResolver::new().resolve("8.8.8.8").await.unwrap();
    assert!(!domain.as_str().is_empty());
}
