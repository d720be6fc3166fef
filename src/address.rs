// 📍 Address Rebaser - absolute addresses → reference-relative offsets
//
// Stored addresses are relative to a fixed reference base. A user working
// against a binary loaded somewhere else enters the absolute address plus
// the load base, and we shift it back:
//
//   delta  = base - reference
//   stored = target - delta
//
// All arithmetic is 32-bit with two's-complement wraparound.

use crate::error::{AddressError, AddressField};

/// Default reference base used by the stored offsets
pub const DEFAULT_REFERENCE_BASE: u32 = 0x400000;

// ============================================================================
// PARSING & FORMATTING
// ============================================================================

/// Parse `0x` + 1-8 hex digits into a 32-bit value
pub fn parse_address(value: &str, field: AddressField) -> Result<u32, AddressError> {
    let invalid = || AddressError::Invalid {
        field,
        value: value.to_string(),
    };

    if !(3..=10).contains(&value.len()) {
        return Err(invalid());
    }

    let digits = value.strip_prefix("0x").ok_or_else(invalid)?;

    // from_str_radix tolerates a leading sign, the address format does not
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    u32::from_str_radix(digits, 16).map_err(|_| invalid())
}

/// Numeric value of a stored address, if it is well formed
pub fn address_value(value: &str) -> Option<u32> {
    parse_address(value, AddressField::Address).ok()
}

/// Canonical form: `0x` + uppercase hex without leading zeros
pub fn format_address(value: u32) -> String {
    format!("0x{:X}", value)
}

/// Shift `target` from a binary loaded at `base` to the `reference` base
pub fn rebase(base: u32, target: u32, reference: u32) -> u32 {
    let delta = base.wrapping_sub(reference);
    target.wrapping_sub(delta)
}

// ============================================================================
// REBASER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rebaser {
    /// Base that all stored addresses are relative to
    pub reference: u32,
}

impl Rebaser {
    pub fn new(reference: u32) -> Self {
        Rebaser { reference }
    }

    /// Validate both strings and produce the stored address.
    ///
    /// A missing (or blank) base is `NoBaseAddress`; the caller decides
    /// whether to fall back to a default. The base is validated before the
    /// target so the user is told about the base first.
    pub fn rebase_str(&self, base: Option<&str>, target: &str) -> Result<String, AddressError> {
        let base = match base {
            Some(b) if !b.is_empty() => b,
            _ => return Err(AddressError::NoBaseAddress),
        };

        let base = parse_address(base, AddressField::BaseAddress)?;
        let target = parse_address(target, AddressField::Address)?;

        Ok(format_address(rebase(base, target, self.reference)))
    }

    /// Resolve the base address to use for an entry.
    ///
    /// When nothing was entered, `confirm_default` is asked whether the
    /// default should be used; declining yields `NoBaseAddress`.
    pub fn resolve_base<F>(
        entered: Option<&str>,
        default: &str,
        confirm_default: F,
    ) -> Result<String, AddressError>
    where
        F: FnOnce(&str) -> bool,
    {
        match entered {
            Some(b) if !b.is_empty() => Ok(b.to_string()),
            _ if confirm_default(default) => Ok(default.to_string()),
            _ => Err(AddressError::NoBaseAddress),
        }
    }
}

impl Default for Rebaser {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_BASE)
    }
}

// ============================================================================
// TESTS
// ============================================================================
