// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `shamba enqueue`: capture registrations into the queue.
//!
//! Registrations are validated before anything is queued, so a file with
//! one bad record queues nothing.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use shamba_core::{ItemId, Registration};

use super::{print_json, Context};
use crate::cli::{OutputFormat, RegistrationArgs};
use crate::error::{Error, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Registration>),
    One(Box<Registration>),
}

/// Reads one registration or a JSON array of them from `path` (`-` for stdin).
pub fn read_registrations(path: &Path) -> Result<Vec<Registration>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };

    Ok(match serde_json::from_str(&content)? {
        OneOrMany::Many(list) => list,
        OneOrMany::One(one) => vec![*one],
    })
}

/// Builds a registration from command-line flags.
pub fn registration_from_args(args: &RegistrationArgs) -> Result<Registration> {
    fn required<T: Clone>(value: &Option<T>, field: &'static str) -> Result<T> {
        value.clone().ok_or(Error::FieldRequired { field })
    }

    Ok(Registration {
        full_name: required(&args.full_name, "--full-name")?,
        national_id: required(&args.national_id, "--national-id")?,
        phone_number: required(&args.phone, "--phone")?,
        county: required(&args.county, "--county")?,
        ward: required(&args.ward, "--ward")?,
        crop: required(&args.crop, "--crop")?,
        acreage: required(&args.acreage, "--acreage")?,
        premium_kes: required(&args.premium, "--premium")?,
    })
}

pub async fn run(
    ctx: &Context,
    file: Option<&Path>,
    args: &RegistrationArgs,
    output: OutputFormat,
) -> Result<()> {
    let registrations = match file {
        Some(path) => read_registrations(path)?,
        None if *args == RegistrationArgs::default() => return Err(Error::NoRegistration),
        None => vec![registration_from_args(args)?],
    };
    if registrations.is_empty() {
        return Err(Error::NoRegistration);
    }
    for registration in &registrations {
        registration.validate()?;
    }

    let ids = enqueue_all(ctx, registrations).await?;

    match output {
        OutputFormat::Text => {
            for id in &ids {
                println!("Queued {}", id);
            }
        }
        OutputFormat::Json => print_json(&ids)?,
    }
    Ok(())
}

async fn enqueue_all(ctx: &Context, registrations: Vec<Registration>) -> Result<Vec<ItemId>> {
    let config = ctx.config_or_default()?;
    let queue = ctx.open_queue(&config)?;

    let mut ids = Vec::with_capacity(registrations.len());
    for registration in registrations {
        let id = queue.add_to_queue(registration).await.ok_or(Error::NotPersisted("registration"))?;
        ids.push(id);
    }
    Ok(ids)
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
