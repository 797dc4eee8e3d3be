//! Mconfig command handler.
//!
//! Runs the same southbound path a gateway check-in takes. `--hardware-id`
//! goes through hardware ID resolution; `--network`/`--gateway` acts as an
//! already-authenticated identity.

use std::fmt::Write;

use tabled::Tabled;

use fleetconf_core::{GatewayIdentity, Mconfig, SouthboundService};

use crate::cli::{GlobalOpts, MconfigArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Bytes")]
    bytes: usize,
    #[tabled(rename = "Value")]
    preview: String,
}

fn detail(mconfig: &Mconfig) -> String {
    let rows: Vec<SectionRow> = mconfig
        .configs_by_key
        .iter()
        .map(|(key, blob)| SectionRow {
            key: key.clone(),
            bytes: blob.len(),
            preview: output::blob_preview(blob, 60),
        })
        .collect();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Digest: {} {}",
        mconfig.metadata.digest.algorithm, mconfig.metadata.digest.hex_digest
    );
    let _ = writeln!(out, "Created: {}", mconfig.metadata.created_at);
    let _ = write!(out, "{}", output::render_table(&rows));
    out
}

pub async fn handle(
    southbound: &SouthboundService,
    args: MconfigArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mconfig = match (args.hardware_id, args.network, args.gateway) {
        (Some(hardware_id), _, _) => southbound.get_mconfig_internal(&hardware_id).await?,
        (None, Some(network), Some(gateway)) => {
            southbound
                .get_mconfig(Some(&GatewayIdentity::new(network, gateway)))
                .await?
        }
        _ => {
            return Err(CliError::InvalidArgument {
                message: "pass --hardware-id, or both --network and --gateway".into(),
            });
        }
    };

    let out = output::render_single(&global.output, &mconfig, detail, |m| {
        m.metadata.digest.hex_digest.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
