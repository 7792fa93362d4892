//! Cheap pre-filter run before any body is read.

use std::borrow::Cow;

use http::Method;
use http::header::CONTENT_TYPE;

use percent_encoding::percent_decode_str;

use crate::request::Request;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Whether `req` is worth buffering: a JSON `POST` whose decoded path starts
/// with one of `prefixes`. An empty prefix list matches every path.
pub(crate) fn admits(req: &Request, prefixes: &[String]) -> bool {
    is_json_post(req) && matches_prefix(req.path(), prefixes)
}

fn is_json_post(req: &Request) -> bool {
    req.method() == Method::POST
        && req
            .header(CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with(JSON_MEDIA_TYPE))
}

fn matches_prefix(path: &str, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    // `/push%2Fx` is `/push/x`; undecodable escapes stay as written
    let path: Cow<'_, [u8]> = percent_decode_str(path).into();
    prefixes.iter().any(|p| path.starts_with(p.as_bytes()))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_body_util::Full;

    use super::*;

    fn request(method: Method, path: &str, content_type: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(method).uri(path);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        Request::new(builder.body(Full::new(Bytes::new())).unwrap())
    }

    #[test]
    fn requires_post() {
        for method in [Method::GET, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(!admits(&request(method, "/", Some("application/json")), &[]));
        }
        assert!(admits(&request(Method::POST, "/", Some("application/json")), &[]));
    }

    #[test]
    fn requires_json_content_type_prefix() {
        let prefixes: &[String] = &[];

        assert!(admits(&request(Method::POST, "/", Some("application/json; charset=utf-8")), prefixes));
        assert!(!admits(&request(Method::POST, "/", Some("text/plain")), prefixes));
        assert!(!admits(&request(Method::POST, "/", Some("Application/JSON")), prefixes));
        assert!(!admits(&request(Method::POST, "/", None), prefixes));
    }

    #[test]
    fn prefixes_restrict_paths() {
        let prefixes = vec!["/push/".to_owned(), "/hooks".to_owned()];
        let json = Some("application/json");

        assert!(admits(&request(Method::POST, "/push/orders", json), &prefixes));
        assert!(admits(&request(Method::POST, "/hooks-v2", json), &prefixes));
        assert!(!admits(&request(Method::POST, "/push", json), &prefixes));
        assert!(!admits(&request(Method::POST, "/other/endpoint", json), &prefixes));
    }

    #[test]
    fn prefixes_match_the_decoded_path() {
        let prefixes = vec!["/push/".to_owned()];
        let json = Some("application/json");

        assert!(admits(&request(Method::POST, "/push%2Fx", json), &prefixes));
        assert!(admits(&request(Method::POST, "/%70ush/x", json), &prefixes));
        assert!(!admits(&request(Method::POST, "/push%zz", json), &prefixes));
    }

    #[test]
    fn prefix_order_does_not_matter() {
        let forward = vec!["/a".to_owned(), "/b".to_owned()];
        let reverse = vec!["/b".to_owned(), "/a".to_owned()];

        for path in ["/a/1", "/b/2", "/c/3"] {
            let req = request(Method::POST, path, Some("application/json"));
            assert_eq!(admits(&req, &forward), admits(&req, &reverse));
        }
    }
}
