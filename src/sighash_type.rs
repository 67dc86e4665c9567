// SPDX-License-Identifier: CC0-1.0

use core::fmt;
use core::str::FromStr;

use bitcoin::sighash::{EcdsaSighashType, NonStandardSighashTypeError};

use crate::prelude::*;

/// The sighash type of an input as carried in `PSBT_IN_SIGHASH_TYPE`.
///
/// The field is a raw little-endian `u32` on the wire and may hold any value, standard or not.
/// Use [`PsbtSighashType::ecdsa_hash_ty`] to get at the standard ECDSA flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct PsbtSighashType {
    pub(crate) inner: u32,
}

impl fmt::Display for PsbtSighashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ecdsa_hash_ty() {
            Ok(ecdsa_hash_ty) => fmt::Display::fmt(&ecdsa_hash_ty, f),
            Err(_) => write!(f, "{:#x}", self.inner),
        }
    }
}

impl FromStr for PsbtSighashType {
    type Err = ParseSighashTypeError;

    /// Accepts the standard names ("SIGHASH_ALL" etc.) or any value as `0x` prefixed hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(ty) = EcdsaSighashType::from_str(s) {
            return Ok(ty.into());
        }

        if let Some(hex) = s.strip_prefix("0x") {
            if let Ok(inner) = u32::from_str_radix(hex, 16) {
                return Ok(PsbtSighashType { inner });
            }
        }

        Err(ParseSighashTypeError { unrecognized: s.to_owned() })
    }
}

impl From<EcdsaSighashType> for PsbtSighashType {
    fn from(ecdsa_hash_ty: EcdsaSighashType) -> Self {
        PsbtSighashType { inner: ecdsa_hash_ty as u32 }
    }
}

impl PsbtSighashType {
    /// Returns the [`EcdsaSighashType`] if the [`PsbtSighashType`] is a standard one.
    pub fn ecdsa_hash_ty(self) -> Result<EcdsaSighashType, NonStandardSighashTypeError> {
        EcdsaSighashType::from_standard(self.inner)
    }

    /// Creates a [`PsbtSighashType`] from a raw `u32`, standard or not.
    pub fn from_u32(n: u32) -> PsbtSighashType { PsbtSighashType { inner: n } }

    /// Converts [`PsbtSighashType`] to a raw `u32` sighash flag.
    pub fn to_u32(self) -> u32 { self.inner }
}

/// Error returned for an unrecognized sighash string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParseSighashTypeError {
    /// The unrecognized string we attempted to parse.
    pub unrecognized: String,
}

impl fmt::Display for ParseSighashTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unrecognized SIGHASH string '{}'", self.unrecognized)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseSighashTypeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}
