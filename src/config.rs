use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, Result};

/// engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub reference: ReferenceConfig,
    pub policies: BookingPolicies,
}

/// human-readable reference codes, e.g. `CTR-2024-0007`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    pub standard_prefix: String,
    pub assistance_prefix: String,
    /// zero padding of the yearly sequence number
    pub sequence_width: usize,
}

/// what to do with a payment that takes the balance below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// accept and emit an overpayment event
    Flag,
    /// refuse the payment
    Reject,
}

/// business policies left open by the back-office
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicies {
    /// a draft blocks other bookings of the same vehicle at creation
    ///
    /// When off, overlapping drafts can all be created and the single winner
    /// is decided at validation, which re-checks occupying bookings.
    pub drafts_claim_vehicle: bool,
    pub overpayment: OverpaymentPolicy,
    /// balances may still be settled once a booking is closed
    pub accept_payments_after_close: bool,
    /// refuse to close while the deposit is still held
    pub require_deposit_disposition_before_close: bool,
}

impl EngineConfig {
    /// defaults matching the agency's day-to-day practice
    pub fn standard() -> Self {
        Self {
            reference: ReferenceConfig {
                standard_prefix: "CTR".to_string(),
                assistance_prefix: "AST".to_string(),
                sequence_width: 4,
            },
            policies: BookingPolicies {
                drafts_claim_vehicle: true,
                overpayment: OverpaymentPolicy::Flag,
                accept_payments_after_close: true,
                require_deposit_disposition_before_close: false,
            },
        }
    }

    /// no overpayment, no payment after close, deposit handled before close
    pub fn strict() -> Self {
        let mut config = Self::standard();
        config.policies.overpayment = OverpaymentPolicy::Reject;
        config.policies.accept_payments_after_close = false;
        config.policies.require_deposit_disposition_before_close = true;
        config
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BookingError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let reference = &self.reference;
        if reference.standard_prefix.trim().is_empty() || reference.assistance_prefix.trim().is_empty() {
            return Err(BookingError::InvalidConfiguration {
                message: "reference prefixes must not be empty".to_string(),
            });
        }
        if reference.standard_prefix == reference.assistance_prefix {
            return Err(BookingError::InvalidConfiguration {
                message: format!(
                    "standard and assistance bookings share prefix {}",
                    reference.standard_prefix
                ),
            });
        }
        if !(1..=8).contains(&reference.sequence_width) {
            return Err(BookingError::InvalidConfiguration {
                message: format!("sequence width {} outside 1..=8", reference.sequence_width),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ReferenceConfig {
    pub fn format(&self, assistance: bool, year: i32, sequence: u32) -> String {
        let prefix = if assistance {
            &self.assistance_prefix
        } else {
            &self.standard_prefix
        };
        format!("{}-{}-{:0width$}", prefix, year, sequence, width = self.sequence_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(EngineConfig::standard().validate().is_ok());
        assert!(EngineConfig::strict().validate().is_ok());
        assert_eq!(EngineConfig::strict().policies.overpayment, OverpaymentPolicy::Reject);
    }

    #[test]
    fn test_reference_format() {
        let reference = EngineConfig::standard().reference;
        assert_eq!(reference.format(false, 2024, 7), "CTR-2024-0007");
        assert_eq!(reference.format(true, 2025, 12345), "AST-2025-12345");
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_string(&EngineConfig::strict()).unwrap();
        assert!(json.contains("\"reject\""));
        assert_eq!(EngineConfig::from_json(&json).unwrap(), EngineConfig::strict());
    }

    #[test]
    fn test_json_rejects_shared_prefix() {
        let mut config = EngineConfig::standard();
        config.reference.assistance_prefix = "CTR".to_string();
        let json = serde_json::to_string(&config).unwrap();
        let err = EngineConfig::from_json(&json).unwrap_err();
        assert!(matches!(err, BookingError::InvalidConfiguration { .. }));

        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}
