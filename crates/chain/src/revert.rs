use alloy::hex;
use alloy::primitives::Bytes;
use alloy::sol_types::{Panic, Revert as RevertReason, SolError};
use std::fmt;

/// ABI-encoded revert data of a failed call.
///
/// Custom errors keep their 4-byte selector so callers can match on the
/// exact `sol!` error type, the way `revertedWith` does in JS tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revert {
    data: Bytes,
}

impl Revert {
    /// A revert without data, as produced by a bare `revert()`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn with_error<E: SolError>(error: E) -> Self {
        Self {
            data: error.abi_encode().into(),
        }
    }

    /// `Error(string)` revert data.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self::with_error(RevertReason {
            reason: reason.into(),
        })
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|bytes| bytes.try_into().ok())
    }

    pub fn is<E: SolError>(&self) -> bool {
        self.selector() == Some(E::SELECTOR)
    }

    pub fn decode<E: SolError>(&self) -> Option<E> {
        if !self.is::<E>() {
            return None;
        }
        E::abi_decode(&self.data).ok()
    }

    /// The message of an `Error(string)` revert.
    pub fn reason(&self) -> Option<String> {
        self.decode::<RevertReason>().map(|revert| revert.reason)
    }

    /// Human readable form; `signatures` maps custom error selectors to
    /// their Solidity signatures.
    pub fn describe_with(&self, signatures: &[([u8; 4], &'static str)]) -> String {
        if self.data.is_empty() {
            return "<empty revert data>".to_string();
        }
        if let Some(reason) = self.reason() {
            return reason;
        }
        if let Some(panic) = self.decode::<Panic>() {
            return format!("Panic({})", panic.code);
        }
        match self.selector() {
            Some(selector) => signatures
                .iter()
                .find(|(known, _)| *known == selector)
                .map(|(_, signature)| signature.to_string())
                .unwrap_or_else(|| format!("custom error {}", hex::encode_prefixed(selector))),
            None => format!("malformed revert data {}", hex::encode_prefixed(&self.data)),
        }
    }
}

impl fmt::Display for Revert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "execution reverted: {}", self.describe_with(&[]))
    }
}

impl std::error::Error for Revert {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol;

    sol! {
        error Boom(uint256 code);
        error Other();
    }

    #[test]
    fn custom_errors_match_by_selector() {
        let revert = Revert::with_error(Boom {
            code: alloy::primitives::U256::from(7u64),
        });
        assert!(revert.is::<Boom>());
        assert!(!revert.is::<Other>());
        assert_eq!(revert.selector(), Some(Boom::SELECTOR));
        let decoded = revert.decode::<Boom>().unwrap();
        assert_eq!(decoded.code, alloy::primitives::U256::from(7u64));
    }

    #[test]
    fn string_reasons_round_trip() {
        let revert = Revert::with_reason("insufficient balance");
        assert_eq!(revert.reason().as_deref(), Some("insufficient balance"));
        assert_eq!(revert.to_string(), "execution reverted: insufficient balance");
    }

    #[test]
    fn describe_uses_known_signatures() {
        let revert = Revert::with_error(Other {});
        let described = revert.describe_with(&[(Other::SELECTOR, "Other()")]);
        assert_eq!(described, "Other()");
        assert!(revert.describe_with(&[]).starts_with("custom error 0x"));
        assert_eq!(Revert::empty().describe_with(&[]), "<empty revert data>");
    }
}
