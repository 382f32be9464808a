//! # License Subcommands
//!
//! `create`, `extend`, `revoke`, `show`, `list` and `history`. Each command
//! runs against any implementation of the admin contracts and prints its
//! result to the given writer as pretty JSON.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;

use lauth_core::{ExtraData, LicenseKey, Timestamp};
use lauth_registry::{LicenseAdmin, LicenseLookup, NewLicense};
use lauth_state::LicenseStatus;

/// License lifecycle subcommands.
#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// Issue a new license and print it (including its key).
    Create(CreateArgs),

    /// Move a license's expiration date strictly forward.
    Extend {
        /// License key.
        key: LicenseKey,
        /// New expiration (RFC 3339, e.g. 2027-01-01T00:00:00Z).
        expiration: Timestamp,
    },

    /// Revoke a license permanently. Revoking twice is not an error.
    Revoke {
        /// License key.
        key: LicenseKey,
    },

    /// Show one license with its current status.
    Show {
        /// License key.
        key: LicenseKey,
    },

    /// List licenses, oldest first.
    List {
        /// Only licenses with this status (active, expired, revoked).
        #[arg(long)]
        status: Option<LicenseStatus>,
    },

    /// Show the transition history of a license.
    History {
        /// License key.
        key: LicenseKey,
    },
}

/// Arguments for `lauth create`.
#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Expiration (RFC 3339). Omit for a license that never expires.
    #[arg(long)]
    pub expires: Option<Timestamp>,

    /// Opaque JSON document attached to the license.
    #[arg(long, conflicts_with = "extra_data_file")]
    pub extra_data: Option<String>,

    /// Read the attached JSON document from a file.
    #[arg(long)]
    pub extra_data_file: Option<PathBuf>,
}

impl CreateArgs {
    /// Assemble the creation request, reading extra data from disk if asked.
    pub fn to_request(&self) -> anyhow::Result<NewLicense> {
        let extra_data = match (&self.extra_data, &self.extra_data_file) {
            (Some(text), _) => {
                Some(ExtraData::from_json_text(text.as_str()).context("--extra-data")?)
            }
            (None, Some(path)) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Some(
                    ExtraData::from_bytes(&bytes)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            (None, None) => None,
        };
        Ok(NewLicense {
            expiration_date: self.expires,
            extra_data,
        })
    }
}

/// Run a license subcommand against `admin`, writing the result to `out`.
pub fn run_license<A, W>(command: &LicenseCommand, admin: &A, out: &mut W) -> anyhow::Result<()>
where
    A: LicenseAdmin + LicenseLookup,
    W: Write,
{
    match command {
        LicenseCommand::Create(args) => {
            let license = admin.create_license(args.to_request()?)?;
            tracing::info!(key = %license.key, "license created");
            print_json(out, &license)
        }
        LicenseCommand::Extend { key, expiration } => {
            let license = admin.extend_license(key, *expiration)?;
            tracing::info!(%key, %expiration, "license extended");
            print_json(out, &license)
        }
        LicenseCommand::Revoke { key } => {
            let license = admin.revoke_license(key)?;
            tracing::info!(%key, "license revoked");
            print_json(out, &license)
        }
        LicenseCommand::Show { key } => print_json(out, &admin.get_license(key)?),
        LicenseCommand::List { status } => print_json(out, &admin.list_licenses(*status)?),
        LicenseCommand::History { key } => print_json(out, &admin.license_history(key)?),
    }
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("writing JSON output")?;
    writeln!(out).context("writing JSON output")?;
    Ok(())
}
