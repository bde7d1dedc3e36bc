//! Shared fixtures: RSA test keys, token signing and a counting fake key set.
#![allow(dead_code)]

use std::{
    sync::{
        Arc, LazyLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::{RsaPrivateKey, traits::PublicKeyParts};
use serde_json::{Value, json};
use task_api::services::auth::BearerGate;
use task_api::services::auth::key_cache::{KeyCache, MemoryKeyCache};
use task_api::services::auth::key_set::{KeySetError, KeySetSource};
use task_api::services::auth::verifier::VerifierPolicy;

pub const ISSUER: &str = "https://idp.example.com/realms/tasks";
pub const AUDIENCE: &str = "task-api";

pub struct TestKeyPair {
    pub private_key_pem: String,
    pub n: String,
    pub e: String,
}

impl TestKeyPair {
    fn generate() -> Self {
        use rsa::{pkcs8::EncodePrivateKey, rand_core::OsRng};

        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("generate RSA key");

        Self {
            n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
            private_key_pem: private_key
                .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
                .expect("export private key")
                .to_string(),
        }
    }

    pub fn jwk(&self, kid: &str) -> Value {
        json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": kid,
            "n": self.n,
            "e": self.e,
        })
    }
}

/// Published as `k1`.
pub static K1: LazyLock<TestKeyPair> = LazyLock::new(TestKeyPair::generate);
/// Never published.
pub static ROGUE: LazyLock<TestKeyPair> = LazyLock::new(TestKeyPair::generate);

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn claims(sub: &str) -> Value {
    json!({
        "sub": sub,
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": now(),
        "exp": now() + 300,
    })
}

pub fn sign_with(keys: &TestKeyPair, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(keys.private_key_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

pub fn sign(kid: &str, claims: &Value) -> String {
    sign_with(&K1, kid, claims)
}

/// `{"alg":"none"}` token with an empty signature.
pub fn unsigned(kid: &str, claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none", "kid": kid}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}

pub fn key_set() -> JwkSet {
    serde_json::from_value(json!({ "keys": [K1.jwk("k1")] })).unwrap()
}

#[derive(Clone, Copy)]
pub enum Behaviour {
    Serve,
    Fail,
    Hang,
}

/// In-memory provider that counts fetches.
pub struct FakeKeySet {
    pub set: JwkSet,
    pub behaviour: Behaviour,
    pub fetches: AtomicUsize,
}

impl FakeKeySet {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            set: key_set(),
            behaviour,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for FakeKeySet {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Serve => Ok(self.set.clone()),
            Behaviour::Fail => Err(KeySetError::Status(503)),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(self.set.clone())
            }
        }
    }
}

pub fn policy() -> VerifierPolicy {
    VerifierPolicy {
        issuer: Some(ISSUER.to_string()),
        audience: Some(AUDIENCE.to_string()),
        ..VerifierPolicy::default()
    }
}

pub fn gate_with(
    source: Arc<FakeKeySet>,
    cache: Arc<dyn KeyCache>,
    policy: VerifierPolicy,
) -> BearerGate {
    BearerGate::new(source, cache, Duration::from_millis(200), policy)
}

pub fn gate(source: Arc<FakeKeySet>) -> BearerGate {
    gate_with(
        source,
        Arc::new(MemoryKeyCache::new(Duration::from_secs(600))),
        policy(),
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
