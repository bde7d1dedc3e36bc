/*
 * Responsibility
 * - 署名鍵キャッシュが使う KV バックエンドの抽象 (CacheClient) と Valkey 実装
 */
pub mod client;
pub mod valkey;

pub use client::{CacheClient, CacheError};
pub use valkey::ValkeyClient;
