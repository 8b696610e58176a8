// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Farmer registration records.
//!
//! A registration is the payload the client buffers and the receiver
//! stores. The receiver deduplicates on [`Registration::natural_key`], which
//! is what makes at-least-once delivery from the client safe.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One farmer's insurance registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub national_id: String,
    pub phone_number: String,
    pub county: String,
    pub ward: String,
    pub crop: String,
    /// Insured area in acres.
    pub acreage: f64,
    /// Computed premium in whole shillings.
    pub premium_kes: u64,
}

impl Registration {
    /// Dedup key: the national identifier, trimmed and upper-cased.
    pub fn natural_key(&self) -> String {
        self.national_id.trim().to_uppercase()
    }

    /// Checks the fields the receiver refuses to store without.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("fullName", &self.full_name),
            ("nationalId", &self.national_id),
            ("phoneNumber", &self.phone_number),
            ("county", &self.county),
            ("ward", &self.ward),
            ("crop", &self.crop),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidRegistration { field, reason: "is required".to_string() });
            }
        }

        if !self.national_id.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidRegistration {
                field: "nationalId",
                reason: format!("'{}' must be alphanumeric", self.national_id),
            });
        }

        if !is_valid_phone(&self.phone_number) {
            return Err(Error::InvalidRegistration {
                field: "phoneNumber",
                reason: format!("'{}' must be 9-12 digits", self.phone_number),
            });
        }

        if !(self.acreage.is_finite() && self.acreage > 0.0) {
            return Err(Error::InvalidRegistration {
                field: "acreage",
                reason: format!("{} must be greater than zero", self.acreage),
            });
        }

        Ok(())
    }
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.trim().strip_prefix('+').unwrap_or(phone.trim());
    (9..=12).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
