use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Connection and credential settings for one bucket.
#[derive(Debug, Clone)]
pub struct PresignerConfig {
    /// S3-compatible endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,
    pub bucket: String,
    /// Signing region; R2 uses `auto`
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Public base under which uploaded objects are served,
    /// e.g. a CDN domain in front of the bucket
    pub public_base_url: String,
}

/// Generates SigV4 query-string presigned URLs for object PUTs.
pub struct Presigner {
    config: PresignerConfig,
}

impl Presigner {
    pub fn new(config: PresignerConfig) -> Self {
        Self {
            config: PresignerConfig {
                endpoint: config.endpoint.trim_end_matches('/').to_string(),
                public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
                ..config
            },
        }
    }

    /// Presign a PUT for `key`, valid for `expires_in_secs`. The client must
    /// send the same `Content-Type` header it was signed with.
    pub fn presign_put(&self, key: &str, content_type: &str, expires_in_secs: u64) -> String {
        self.presign_put_at(key, content_type, expires_in_secs, Utc::now())
    }

    /// Same as [`presign_put`](Self::presign_put) with an explicit signing
    /// time, so callers (and tests) control the clock.
    pub fn presign_put_at(
        &self,
        key: &str,
        content_type: &str,
        expires_in_secs: u64,
        signed_at: DateTime<Utc>,
    ) -> String {
        let amz_date = signed_at.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = signed_at.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/s3/aws4_request", datestamp, self.config.region);
        let credential = format!("{}/{}", self.config.access_key_id, scope);

        let host = host_of(&self.config.endpoint);
        let canonical_uri = format!("/{}/{}", self.config.bucket, uri_encode(key, false));

        // Query parameters in canonical (sorted) order
        let canonical_query = format!(
            "X-Amz-Algorithm=AWS4-HMAC-SHA256\
             &X-Amz-Credential={}\
             &X-Amz-Date={}\
             &X-Amz-Expires={}\
             &X-Amz-SignedHeaders={}",
            uri_encode(&credential, true),
            amz_date,
            expires_in_secs,
            uri_encode("content-type;host", true),
        );

        let canonical_headers = format!("content-type:{}\nhost:{}\n", content_type.trim(), host);
        let canonical_request = format!(
            "PUT\n{}\n{}\n{}\ncontent-type;host\nUNSIGNED-PAYLOAD",
            canonical_uri, canonical_query, canonical_headers,
        );

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes())),
        );

        let signature = hex::encode(self.signing_key(&datestamp, &string_to_sign));

        format!(
            "{}{}?{}&X-Amz-Signature={}",
            self.config.endpoint, canonical_uri, canonical_query, signature,
        )
    }

    /// Public URL the object is served from after upload.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url, uri_encode(key, false))
    }

    fn signing_key(&self, datestamp: &str, string_to_sign: &str) -> Vec<u8> {
        let k_date = hmac_sha256(
            format!("AWS4{}", self.config.secret_access_key).as_bytes(),
            datestamp.as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, self.config.region.as_bytes());
        let k_service = hmac_sha256(&k_region, b"s3");
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        hmac_sha256(&k_signing, string_to_sign.as_bytes())
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn host_of(endpoint: &str) -> &str {
    endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint)
}

/// RFC 3986 encoding per the SigV4 rules: unreserved characters pass
/// through, `/` is kept for object keys but encoded inside values.
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn presigner() -> Presigner {
        Presigner::new(PresignerConfig {
            endpoint: "https://acct.r2.cloudflarestorage.com/".to_string(),
            bucket: "postflow-media".to_string(),
            region: "auto".to_string(),
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secretkey".to_string(),
            public_base_url: "https://media.postflow.test/".to_string(),
        })
    }

    fn signed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 21, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_presign_put_query_shape() {
        let url = presigner().presign_put_at("uploads/u1/img.png", "image/png", 900, signed_at());

        assert!(url.starts_with(
            "https://acct.r2.cloudflarestorage.com/postflow-media/uploads/u1/img.png?"
        ));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains("X-Amz-Credential=AKIDEXAMPLE%2F20240521%2Fauto%2Fs3%2Faws4_request"));
        assert!(url.contains("X-Amz-Date=20240521T120000Z"));
        assert!(url.contains("X-Amz-Expires=900"));
        assert!(url.contains("X-Amz-SignedHeaders=content-type%3Bhost"));
    }

    #[test]
    fn test_signature_is_hex_and_deterministic() {
        let p = presigner();
        let a = p.presign_put_at("k.png", "image/png", 600, signed_at());
        let b = p.presign_put_at("k.png", "image/png", 600, signed_at());
        assert_eq!(a, b);

        let sig = a.split("X-Amz-Signature=").nth(1).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_varies_with_inputs() {
        let p = presigner();
        let base = p.presign_put_at("k.png", "image/png", 600, signed_at());
        let other_key = p.presign_put_at("k2.png", "image/png", 600, signed_at());
        let other_type = p.presign_put_at("k.png", "image/jpeg", 600, signed_at());

        let sig = |u: &str| u.split("X-Amz-Signature=").nth(1).unwrap().to_string();
        assert_ne!(sig(&base), sig(&other_key));
        assert_ne!(sig(&base), sig(&other_type));
    }

    #[test]
    fn test_key_encoding_keeps_slashes() {
        let url = presigner().presign_put_at("a b/c+d.png", "image/png", 600, signed_at());
        assert!(url.contains("/postflow-media/a%20b/c%2Bd.png?"));
    }

    #[test]
    fn test_public_url() {
        let p = presigner();
        assert_eq!(
            p.public_url("uploads/u1/img.png"),
            "https://media.postflow.test/uploads/u1/img.png"
        );
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://x.example.com"), "x.example.com");
        assert_eq!(host_of("x.example.com"), "x.example.com");
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("abc-123_~.", true), "abc-123_~.");
        assert_eq!(uri_encode("a/b", false), "a/b");
        assert_eq!(uri_encode("a/b", true), "a%2Fb");
        assert_eq!(uri_encode("a b;", true), "a%20b%3B");
    }
}
