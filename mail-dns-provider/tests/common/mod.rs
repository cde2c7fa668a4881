//! Shared helpers for the mock-server tests

#![allow(dead_code)]

/// Assert that an `Option` is `Some` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// Assert that a `Result` is `Ok` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(res.is_ok(), "{}: {res:?}", format_args!($($msg)+));
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Cloudflare success envelope around `result`.
pub fn cf_ok(result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": { "page": 1, "per_page": 50, "total_pages": 1, "count": 1, "total_count": 1 }
    })
}

/// Cloudflare failure envelope with one error.
pub fn cf_err(code: i64, message: &str) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null
    })
}

/// Cloudflare zone object.
pub fn cf_zone(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({ "id": id, "name": name, "status": "active" })
}

/// Route53 `ChangeInfo` response body.
pub fn r53_change_info(root: &str, id: &str, status: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<{root} xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <ChangeInfo>
    <Id>/change/{id}</Id>
    <Status>{status}</Status>
    <SubmittedAt>2024-01-15T09:30:00.000Z</SubmittedAt>
  </ChangeInfo>
</{root}>"#
    )
}

/// Route53 error body.
pub fn r53_error(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ErrorResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <Error><Type>Sender</Type><Code>{code}</Code><Message>{message}</Message></Error>
  <RequestId>00000000-0000-0000-0000-000000000000</RequestId>
</ErrorResponse>"#
    )
}

/// Route53 empty record-set listing.
pub fn r53_empty_rrsets() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<ListResourceRecordSetsResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <ResourceRecordSets></ResourceRecordSets>
  <IsTruncated>false</IsTruncated>
  <MaxItems>1</MaxItems>
</ListResourceRecordSetsResponse>"#
        .to_string()
}
