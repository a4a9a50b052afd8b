// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Pingback fault codes.
//!
//! Faults are protocol data: they travel over the wire inside an XML-RPC
//! fault envelope and through the local acceptance hook. They are not
//! Rust errors.

use crate::error::Error;

/// Closed set of fault codes defined by the Pingback 1.0 specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    /// Requested method not found (-32601)
    MethodNotFound,
    /// General or unspecified error (0)
    GeneralError,
    /// The source URI does not exist (16)
    SourceDoesNotExist,
    /// The source does not contain a link to the target (17)
    NoLinkToTarget,
    /// The target URI does not exist (32)
    TargetDoesNotExist,
    /// The target cannot be used as a pingback target (33)
    TargetCannotBeUsed,
    /// The pingback has already been registered (48)
    AlreadyRegistered,
    /// Access denied (49)
    AccessDenied,
}

impl FaultCode {
    /// Every fault code, in table order.
    pub const ALL: [FaultCode; 8] = [
        FaultCode::MethodNotFound,
        FaultCode::GeneralError,
        FaultCode::SourceDoesNotExist,
        FaultCode::NoLinkToTarget,
        FaultCode::TargetDoesNotExist,
        FaultCode::TargetCannotBeUsed,
        FaultCode::AlreadyRegistered,
        FaultCode::AccessDenied,
    ];

    /// Numeric value carried in `faultCode`.
    pub fn code(self) -> i32 {
        match self {
            Self::MethodNotFound => -32601,
            Self::GeneralError => 0,
            Self::SourceDoesNotExist => 16,
            Self::NoLinkToTarget => 17,
            Self::TargetDoesNotExist => 32,
            Self::TargetCannotBeUsed => 33,
            Self::AlreadyRegistered => 48,
            Self::AccessDenied => 49,
        }
    }

    /// Human-readable text carried in `faultString`.
    pub fn message(self) -> &'static str {
        match self {
            Self::MethodNotFound => "Requested method not found.",
            Self::GeneralError => "Error.",
            Self::SourceDoesNotExist => "The source does not exist.",
            Self::NoLinkToTarget => "The source does not contain a link to the target.",
            Self::TargetDoesNotExist => "The specified target does not exist.",
            Self::TargetCannotBeUsed => "The specified target cannot be used as a target.",
            Self::AlreadyRegistered => "The pingback has already been registered.",
            Self::AccessDenied => "Access denied.",
        }
    }
}

impl std::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl TryFrom<i32> for FaultCode {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        FaultCode::ALL
            .into_iter()
            .find(|fault| fault.code() == code)
            .ok_or(Error::UnknownFaultCode(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_table_values() {
        assert_eq!(FaultCode::MethodNotFound.code(), -32601);
        assert_eq!(FaultCode::GeneralError.code(), 0);
        assert_eq!(FaultCode::SourceDoesNotExist.code(), 16);
        assert_eq!(FaultCode::NoLinkToTarget.code(), 17);
        assert_eq!(FaultCode::TargetDoesNotExist.code(), 32);
        assert_eq!(FaultCode::TargetCannotBeUsed.code(), 33);
        assert_eq!(FaultCode::AlreadyRegistered.code(), 48);
        assert_eq!(FaultCode::AccessDenied.code(), 49);
    }

    #[test]
    fn test_try_from_known_and_unknown() {
        for fault in FaultCode::ALL {
            assert_eq!(FaultCode::try_from(fault.code()).unwrap(), fault);
        }
        assert!(matches!(
            FaultCode::try_from(99),
            Err(Error::UnknownFaultCode(99))
        ));
    }
}
