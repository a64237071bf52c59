//! Identity Verifier trait 定義

use super::{AuthError, Identity};

/// 接続時に提示された認証情報を検証し、`Identity` を解決する
///
/// 検証はハンドシェイクの他のどの処理よりも先に行われる。
pub trait IdentityVerifier: Send + Sync {
    /// * `None` または空の認証情報 → `AuthError::Unauthenticated`
    /// * 不正な認証情報 → `AuthError::InvalidCredential`
    fn verify(&self, credential: Option<&str>) -> Result<Identity, AuthError>;
}
